//! Error taxonomy for a rewrite run.
//!
//! Every failure is fatal: errors propagate to the binary, which prints a
//! single message naming the phase and, where there is one, the file.

use crate::observability::RunPhase;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The semantic model could not be produced, or it reports errors.
    #[error("[{phase}] failed to load semantic model: {message}")]
    Load { phase: RunPhase, message: String },

    /// A reference package or declaration is missing or has the wrong shape.
    #[error("[{phase}] {message}")]
    Discovery { phase: RunPhase, message: String },

    /// A matched reference could not be followed to its declaration.
    #[error("[{phase}] cannot resolve `{name}` in {}: {message}", file.display())]
    Resolution {
        phase: RunPhase,
        name: String,
        file: PathBuf,
        message: String,
    },

    /// A planned mutation did not find its target node.
    #[error("[{phase}] {message} in {}", file.display())]
    Rewrite {
        phase: RunPhase,
        file: PathBuf,
        message: String,
    },

    #[error("[{phase}] {action} {}: {source}", path.display())]
    Io {
        phase: RunPhase,
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            phase: RunPhase::Load,
            message: message.into(),
        }
    }

    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            phase: RunPhase::Registry,
            message: message.into(),
        }
    }

    pub fn resolution(
        name: impl Into<String>,
        file: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            phase: RunPhase::Resolve,
            name: name.into(),
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn rewrite(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Rewrite {
            phase: RunPhase::Rewrite,
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn io(
        phase: RunPhase,
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            phase,
            action,
            path: path.into(),
            source,
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Phase the error was raised in, when it belongs to one.
    pub fn phase(&self) -> Option<RunPhase> {
        match self {
            Self::Load { phase, .. }
            | Self::Discovery { phase, .. }
            | Self::Resolution { phase, .. }
            | Self::Rewrite { phase, .. }
            | Self::Io { phase, .. } => Some(*phase),
            Self::Config { .. } => None,
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
