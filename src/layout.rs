//! Sorting loaded packages into the two reference SDK packages and the
//! service packages the rewrite runs over.

use crate::config::ProjectConfig;
use crate::errors::{Error, Result};
use crate::program::{Package, Program};

/// Index-based view of a [`Program`]'s packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Package declaring the descriptor-convention function type.
    pub descriptor_sdk: usize,
    /// Package declaring the operation-convention function type.
    pub operation_sdk: usize,
    /// Packages whose files are matched and rewritten.
    pub services: Vec<usize>,
}

impl ProjectLayout {
    pub fn classify(program: &Program, project: &ProjectConfig) -> Result<Self> {
        let descriptor_path = project.descriptor_sdk_path();
        let operation_path = project.operation_sdk_path();
        let services_prefix = project.services_prefix();

        let mut descriptor_sdk = None;
        let mut operation_sdk = None;
        let mut services = Vec::new();

        for (idx, pkg) in program.packages.iter().enumerate() {
            if pkg.path == descriptor_path {
                descriptor_sdk = Some(idx);
            } else if pkg.path == operation_path {
                operation_sdk = Some(idx);
            } else if pkg.path.starts_with(&services_prefix) {
                services.push(idx);
            }
        }

        let missing = |path: &str| Error::discovery(format!("reference package {} not loaded", path));
        let layout = Self {
            descriptor_sdk: descriptor_sdk.ok_or_else(|| missing(&descriptor_path))?,
            operation_sdk: operation_sdk.ok_or_else(|| missing(&operation_path))?,
            services,
        };
        log::debug!(
            "Classified {} packages: {} service packages",
            program.packages.len(),
            layout.services.len()
        );
        Ok(layout)
    }

    /// Service packages borrowed from `program`, independent of `self`.
    pub fn service_packages<'p>(
        &self,
        program: &'p Program,
    ) -> impl Iterator<Item = (usize, &'p Package)> + use<'_, 'p> {
        self.services.iter().copied().map(move |idx| (idx, &program.packages[idx]))
    }
}
