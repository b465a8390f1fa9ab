use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODULE: &str = "github.com/hashicorp/terraform-provider-azurerm";

fn default_module() -> String {
    DEFAULT_MODULE.to_string()
}

fn default_packages() -> String {
    "./internal/...".to_string()
}

fn default_model_file() -> PathBuf {
    PathBuf::from("semantic-model.json")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Module path the reference and service packages live under.
    #[serde(default = "default_module")]
    pub module: String,
    /// Package selector handed to the semantic model provider.
    #[serde(default = "default_packages")]
    pub packages: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            packages: default_packages(),
        }
    }
}

impl ProjectConfig {
    pub fn descriptor_sdk_path(&self) -> String {
        format!("{}/internal/tf/pluginsdk", self.module)
    }

    pub fn operation_sdk_path(&self) -> String {
        format!("{}/internal/sdk", self.module)
    }

    pub fn services_prefix(&self) -> String {
        format!("{}/internal/services/", self.module)
    }
}

/// Where the semantic model comes from. A configured `command` wins over
/// `model_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Pre-generated model dump, relative to the project root.
    #[serde(default = "default_model_file")]
    pub model_file: PathBuf,
    /// Dumper command; the package selector is appended as last argument.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model_file: default_model_file(),
            command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_paths_derive_from_module() {
        let project = ProjectConfig {
            module: "example.com/provider".into(),
            ..ProjectConfig::default()
        };
        assert_eq!(
            project.descriptor_sdk_path(),
            "example.com/provider/internal/tf/pluginsdk"
        );
        assert_eq!(project.operation_sdk_path(), "example.com/provider/internal/sdk");
        assert_eq!(
            project.services_prefix(),
            "example.com/provider/internal/services/"
        );
    }
}
