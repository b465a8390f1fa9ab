//! Configuration for a rewrite run, read from `.noop-lifecycle.toml`.
//!
//! Only the project layout and the semantic model source are
//! configurable. The match patterns themselves are fixed constants in
//! [`crate::matchers`].

mod core;
mod loader;

pub use self::core::{ProjectConfig, ProviderConfig, RewriteConfig, DEFAULT_MODULE};
pub use loader::{
    directory_ancestors, load_config, load_config_from_path, parse_config, CONFIG_FILE_NAME,
};
