//! Writing modified trees back to disk.

use crate::ast::SourceFile;
use crate::errors::{Error, Result};
use crate::observability::RunPhase;
use crate::printer::render_file;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Renders a modified file and persists it.
///
/// Called at most once per file per run, and only for files that
/// received at least one mutation. Implementations must be shareable
/// across the rewrite workers.
pub trait Serializer: Sync {
    fn write(&self, file: &SourceFile) -> Result<()>;
}

/// Truncates and rewrites each file in place.
#[derive(Debug, Clone)]
pub struct InPlaceWriter {
    root: PathBuf,
}

impl InPlaceWriter {
    /// Relative file paths are resolved against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn target(&self, file: &SourceFile) -> PathBuf {
        self.root.join(&file.path)
    }
}

impl Serializer for InPlaceWriter {
    fn write(&self, file: &SourceFile) -> Result<()> {
        let path = self.target(file);
        let text = render_file(file);
        write_existing(&path, text.as_bytes())?;
        log::info!("Rewrote {}", path.display());
        Ok(())
    }
}

/// Open an existing file write+truncate and replace its contents. The
/// file is never created.
fn write_existing(path: &Path, contents: &[u8]) -> Result<()> {
    let mut f = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| Error::io(RunPhase::Serialize, "opening for rewrite", path, e))?;
    f.write_all(contents)
        .and_then(|()| f.flush())
        .map_err(|e| Error::io(RunPhase::Serialize, "rewriting", path, e))
}

/// Renders each file but leaves the disk untouched.
#[derive(Debug, Clone, Default)]
pub struct DryRunWriter;

impl Serializer for DryRunWriter {
    fn write(&self, file: &SourceFile) -> Result<()> {
        let text = render_file(file);
        log::info!(
            "Would rewrite {} ({} bytes)",
            file.path.display(),
            text.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(path: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(path),
            package: "foo".into(),
            header: Vec::new(),
            imports: Vec::new(),
            decls: Vec::new(),
        }
    }

    #[test]
    fn test_in_place_writer_truncates_existing_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("foo.go"), "package foo\n\n// a much longer original\n").unwrap();

        InPlaceWriter::new(temp.path()).write(&file("foo.go")).unwrap();

        let written = std::fs::read_to_string(temp.path().join("foo.go")).unwrap();
        assert_eq!(written, "package foo\n");
    }

    #[test]
    fn test_in_place_writer_never_creates_files() {
        let temp = TempDir::new().unwrap();
        let err = InPlaceWriter::new(temp.path()).write(&file("missing.go")).unwrap_err();
        assert!(err.to_string().starts_with("[serialize] opening for rewrite"));
        assert!(!temp.path().join("missing.go").exists());
    }

    #[test]
    fn test_dry_run_leaves_disk_alone() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("foo.go");
        std::fs::write(&path, "package   foo\n").unwrap();
        let mut f = file("foo.go");
        f.path = path.clone();

        DryRunWriter.write(&f).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "package   foo\n");
    }
}
