//! Semantic model providers.
//!
//! Parsing and type-checking the Go sources happens outside this crate.
//! A provider hands over the result as a [`Program`]: the parsed files
//! plus the type and binding tables, exchanged as JSON.

use crate::config::ProviderConfig;
use crate::errors::{Error, Result};
use crate::observability::RunPhase;
use crate::program::Program;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Source of the type-checked program.
pub trait SemanticModelProvider {
    /// Load every package matching `selector` under `root`.
    fn load(&self, root: &Path, selector: &str) -> Result<Program>;
}

/// Reads a pre-generated model dump.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    /// `path` is resolved against the project root when relative.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SemanticModelProvider for JsonFileProvider {
    fn load(&self, root: &Path, selector: &str) -> Result<Program> {
        let path = root.join(&self.path);
        log::debug!(
            "Reading semantic model for {} from {}",
            selector,
            path.display()
        );
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::io(RunPhase::Load, "reading semantic model", &path, e))?;
        parse_model(&contents).map_err(|e| Error::load(format!("{}: {}", path.display(), e)))
    }
}

/// Runs an external dumper and parses its standard output.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
}

impl CommandProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl SemanticModelProvider for CommandProvider {
    fn load(&self, root: &Path, selector: &str) -> Result<Program> {
        log::debug!("Running `{} {}` in {}", self.display(), selector, root.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(selector)
            .current_dir(root)
            .output()
            .map_err(|e| Error::load(format!("spawning `{}`: {}", self.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::load(format!(
                "`{}` exited with {}: {}",
                self.display(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::load(format!("`{}` output: {}", self.display(), e)))?;
        parse_model(&stdout).map_err(|e| Error::load(format!("`{}` output: {}", self.display(), e)))
    }
}

pub fn parse_model(contents: &str) -> std::result::Result<Program, serde_json::Error> {
    serde_json::from_str(contents)
}

/// Provider selected by configuration.
pub fn from_config(config: &ProviderConfig) -> Result<Box<dyn SemanticModelProvider>> {
    match &config.command {
        Some(command) => {
            let (program, args) = command
                .split_first()
                .ok_or_else(|| Error::load("provider command is empty"))?;
            Ok(Box::new(CommandProvider::new(program.clone(), args.to_vec())))
        }
        None => Ok(Box::new(JsonFileProvider::new(config.model_file.clone()))),
    }
}

/// Abort when the provider reported any parse or type error.
pub fn ensure_error_free(program: &Program) -> Result<()> {
    let count = program.error_count();
    if count == 0 {
        return Ok(());
    }
    for pkg in &program.packages {
        for err in &pkg.errors {
            log::error!("{}: {}", pkg.path, err);
        }
    }
    Err(Error::load(format!("packages contain {} error(s)", count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Package, PackageError};
    use tempfile::TempDir;

    #[test]
    fn test_json_file_provider_reads_relative_to_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("model.json"),
            r#"{"packages":[{"path":"example.com/svc","name":"svc"}]}"#,
        )
        .unwrap();

        let program = JsonFileProvider::new("model.json")
            .load(temp.path(), "./...")
            .unwrap();
        assert_eq!(program.packages.len(), 1);
        assert_eq!(program.packages[0].name, "svc");
    }

    #[test]
    fn test_json_file_provider_missing_file_is_load_phase_error() {
        let temp = TempDir::new().unwrap();
        let err = JsonFileProvider::new("absent.json")
            .load(temp.path(), "./...")
            .unwrap_err();
        assert_eq!(err.phase(), Some(RunPhase::Load));
    }

    #[test]
    fn test_malformed_model_is_load_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("model.json"), "{not json").unwrap();
        let err = JsonFileProvider::new("model.json")
            .load(temp.path(), "./...")
            .unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let config = ProviderConfig {
            command: Some(Vec::new()),
            ..ProviderConfig::default()
        };
        assert!(from_config(&config).is_err());
    }

    #[test]
    fn test_ensure_error_free_counts_errors() {
        let mut program = Program::default();
        program.packages.push(Package {
            path: "example.com/svc".into(),
            name: "svc".into(),
            files: Vec::new(),
            info: Default::default(),
            errors: vec![PackageError {
                position: Some("svc.go:3:1".into()),
                message: "undefined: foo".into(),
            }],
        });
        let err = ensure_error_free(&program).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[load] failed to load semantic model: packages contain 1 error(s)"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_command_provider_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let err = CommandProvider::new("false", Vec::new())
            .load(temp.path(), "./...")
            .unwrap_err();
        assert!(err.to_string().contains("`false` exited with"));
    }
}
