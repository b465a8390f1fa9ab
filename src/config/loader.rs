use std::fs;
use std::path::{Path, PathBuf};

use super::core::RewriteConfig;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".noop-lifecycle.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse a configuration from TOML text.
pub fn parse_config(contents: &str, origin: &Path) -> Result<RewriteConfig> {
    toml::from_str::<RewriteConfig>(contents)
        .map_err(|e| Error::config(origin, e.message().to_string()))
}

/// Load configuration from an explicit path. The file must exist.
pub fn load_config_from_path(path: &Path) -> Result<RewriteConfig> {
    let contents = fs::read_to_string(path).map_err(|e| Error::config(path, e.to_string()))?;
    let config = parse_config(&contents, path)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Generate directory ancestors up to a depth limit.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find `.noop-lifecycle.toml` in `root` or its ancestors.
///
/// A missing file yields the defaults; a present but unreadable or
/// invalid file is an error.
pub fn load_config(root: &Path) -> Result<RewriteConfig> {
    let found = directory_ancestors(root.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file());

    match found {
        Some(path) => load_config_from_path(&path),
        None => {
            log::debug!(
                "No {} found within {} directories of {}. Using default config.",
                CONFIG_FILE_NAME,
                MAX_TRAVERSAL_DEPTH,
                root.display()
            );
            Ok(RewriteConfig::default())
        }
    }
}
