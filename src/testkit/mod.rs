//! Test support: a builder for typed programs and an in-memory serializer.
//!
//! The builder stands in for the semantic model provider. It sets up the
//! two reference SDK packages under [`MODULE`] and lets a test add service
//! packages, files, functions and typed references:
//!
//! ```rust,ignore
//! use noop_lifecycle::testkit::{ProgramBuilder, MemorySerializer};
//!
//! let mut b = ProgramBuilder::new();
//! let pkg = b.service_package("compute");
//! let file = b.add_file(pkg, "foo_resource.go");
//! let create = b.declare_lifecycle_func(pkg, file, "fooCreate");
//! let value = b.reference(pkg, create);
//! b.descriptor_resource(pkg, file, "resourceFoo", vec![("Create", value)]);
//! let mut program = b.build();
//! ```

mod builder;

pub use builder::{
    descriptor_signature, operation_signature, raw_stmt, return_stmt, ProgramBuilder, MODULE,
};

use crate::ast::SourceFile;
use crate::config::ProjectConfig;
use crate::errors::{Error, Result};
use crate::layout::ProjectLayout;
use crate::matchers::{match_program, MatchSite};
use crate::observability::RunPhase;
use crate::printer::render_file;
use crate::program::Program;
use crate::registry::SignatureRegistry;
use crate::serializer::Serializer;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Project configuration matching [`ProgramBuilder`]'s layout.
pub fn test_project() -> ProjectConfig {
    ProjectConfig {
        module: MODULE.to_string(),
        ..ProjectConfig::default()
    }
}

/// Run both matchers over a builder-made program.
pub fn match_all(program: &Program) -> Vec<MatchSite<'_>> {
    let layout = ProjectLayout::classify(program, &test_project()).expect("test layout");
    let registry = SignatureRegistry::build(program, &layout).expect("test registry");
    match_program(program, &layout, &registry)
}

/// Records every rendered write instead of touching the disk.
#[derive(Debug, Default)]
pub struct MemorySerializer {
    writes: Mutex<BTreeMap<PathBuf, Vec<String>>>,
    fail_on: Option<PathBuf>,
}

impl MemorySerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A serializer that fails when asked to write `path`.
    pub fn failing_on(path: impl Into<PathBuf>) -> Self {
        Self {
            writes: Mutex::default(),
            fail_on: Some(path.into()),
        }
    }

    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.writes.lock().unwrap().keys().cloned().collect()
    }

    pub fn write_count(&self, path: impl AsRef<Path>) -> usize {
        self.writes
            .lock()
            .unwrap()
            .get(path.as_ref())
            .map_or(0, Vec::len)
    }

    /// Text of the last write of `path`.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.writes
            .lock()
            .unwrap()
            .get(path.as_ref())
            .and_then(|w| w.last().cloned())
    }
}

impl Serializer for MemorySerializer {
    fn write(&self, file: &SourceFile) -> Result<()> {
        if self.fail_on.as_deref() == Some(file.path.as_path()) {
            return Err(Error::io(
                RunPhase::Serialize,
                "opening for rewrite",
                &file.path,
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ));
        }
        self.writes
            .lock()
            .unwrap()
            .entry(file.path.clone())
            .or_default()
            .push(render_file(file));
        Ok(())
    }
}
