//! Thread-local context tracking for crash reports.
//!
//! Each thread has its own context (via `thread_local!`); guards restore
//! the previous context on drop, so nesting a file inside a phase works.

use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;

thread_local! {
    static CURRENT_CONTEXT: RefCell<RunContext> = const { RefCell::new(RunContext::new()) };
}

/// What the run was doing when something went wrong.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub phase: Option<RunPhase>,
    pub current_file: Option<PathBuf>,
}

impl RunContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_file: None,
        }
    }
}

/// The strictly ordered phases of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    /// Loading the semantic model from the provider
    Load,
    /// Locating reference packages and extracting target signatures
    Registry,
    /// Running both convention matchers over service packages
    Match,
    /// Following matched references to their declarations
    Resolve,
    /// Applying mutations to file trees
    Rewrite,
    /// Rendering and writing modified files
    Serialize,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Registry => write!(f, "registry"),
            Self::Match => write!(f, "match"),
            Self::Resolve => write!(f, "resolve"),
            Self::Rewrite => write!(f, "rewrite"),
            Self::Serialize => write!(f, "serialize"),
        }
    }
}

/// RAII guard restoring the previous context on drop.
pub struct ContextGuard {
    previous: RunContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

#[must_use]
pub fn set_phase(phase: RunPhase) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        ctx.borrow_mut().phase = Some(phase);
        ContextGuard { previous }
    })
}

#[must_use]
pub fn set_current_file(path: impl Into<PathBuf>) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        ctx.borrow_mut().current_file = Some(path.into());
        ContextGuard { previous }
    })
}

#[must_use]
pub fn get_current_context() -> RunContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}
