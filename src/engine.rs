//! Phase orchestration for one rewrite run.
//!
//! load → registry → match → resolve → rewrite → serialize, strictly in
//! that order. Nothing is carried between runs except the rewritten files.

use crate::config::{ProjectConfig, RewriteConfig};
use crate::errors::Result;
use crate::layout::ProjectLayout;
use crate::matchers::{match_program, Convention};
use crate::observability::{set_phase, RunPhase};
use crate::program::Program;
use crate::provider::{ensure_error_free, SemanticModelProvider};
use crate::registry::SignatureRegistry;
use crate::resolver::{resolve, DefinitionIndex};
use crate::rewriter;
use crate::serializer::Serializer;
use std::path::{Path, PathBuf};
use tracing::info_span;

/// What a run did. Logged, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub descriptor_sites: usize,
    pub operation_sites: usize,
    pub use_site_mutations: usize,
    pub definitions_blanked: usize,
    pub files_written: Vec<PathBuf>,
}

impl RunSummary {
    pub fn mutations(&self) -> usize {
        self.use_site_mutations + self.definitions_blanked
    }
}

/// Load the program under `root` and rewrite it.
pub fn run(
    root: &Path,
    config: &RewriteConfig,
    provider: &dyn SemanticModelProvider,
    serializer: &dyn Serializer,
) -> Result<RunSummary> {
    let mut program = {
        let _phase = set_phase(RunPhase::Load);
        let _span = info_span!("load", root = %root.display()).entered();
        let program = provider.load(root, &config.project.packages)?;
        ensure_error_free(&program)?;
        log::debug!("Loaded {} packages", program.packages.len());
        program
    };

    let summary = rewrite_program(&mut program, &config.project, serializer)?;
    log::info!(
        "Blanked {} definition(s) and {} value(s) across {} file(s)",
        summary.definitions_blanked,
        summary.use_site_mutations,
        summary.files_written.len()
    );
    Ok(summary)
}

/// Run every phase after loading over an already-checked program.
///
/// The program's trees are updated in place, so calling this again on the
/// same program observes the first call's output.
pub fn rewrite_program(
    program: &mut Program,
    project: &ProjectConfig,
    serializer: &dyn Serializer,
) -> Result<RunSummary> {
    let (layout, registry) = {
        let _phase = set_phase(RunPhase::Registry);
        let _span = info_span!("registry").entered();
        let layout = ProjectLayout::classify(program, project)?;
        let registry = SignatureRegistry::build(program, &layout)?;
        (layout, registry)
    };

    let (plan, mut summary) = {
        let sites = {
            let _phase = set_phase(RunPhase::Match);
            let _span = info_span!("match", packages = layout.services.len()).entered();
            match_program(program, &layout, &registry)
        };
        for site in &sites {
            log::debug!(
                "{} site: {}.{} at line {}",
                site.convention,
                site.decl,
                site.key,
                site.line.map_or_else(|| "?".to_string(), |l| l.to_string())
            );
        }

        let _phase = set_phase(RunPhase::Resolve);
        let _span = info_span!("resolve", sites = sites.len()).entered();
        let index = DefinitionIndex::build(program);
        let resolution = resolve(program, &index, &sites)?;
        let plan = rewriter::plan(program, &resolution)?;

        let summary = RunSummary {
            descriptor_sites: count(&sites, Convention::Descriptor),
            operation_sites: count(&sites, Convention::Operation),
            use_site_mutations: plan.use_site_mutations,
            definitions_blanked: plan.definitions_blanked,
            files_written: Vec::new(),
        };
        (plan, summary)
    };

    if plan.is_empty() {
        log::info!("No lifecycle functions left to blank");
        return Ok(summary);
    }

    let _phase = set_phase(RunPhase::Rewrite);
    let _span = info_span!("rewrite", files = plan.files.len()).entered();
    summary.files_written = rewriter::apply(program, plan, serializer)?;
    Ok(summary)
}

fn count(sites: &[crate::matchers::MatchSite<'_>], convention: Convention) -> usize {
    sites.iter().filter(|s| s.convention == convention).count()
}
