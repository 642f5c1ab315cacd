//! Check trait and execution context.

use async_trait::async_trait;

use crate::github::RepoContentProvider;
use crate::pipeline::state::{AnalysisState, CheckOutcome};

/// Context handed to every check executor. The provider is the injected
/// content capability; the rest is per-run configuration.
pub struct CheckContext<'a> {
    pub provider: &'a dyn RepoContentProvider,
    pub repo_url: &'a str,
    /// Explicit repository tag/version override for the metadata builder.
    pub release_tag: Option<&'a str>,
}

/// One step of the analysis pipeline.
///
/// Checks execute strictly in declared list order; `depends_on` documents
/// and asserts the ordering but is not a scheduler input. Executors read the
/// provided snapshot and must not touch shared state - the runner merges the
/// returned outcome.
#[async_trait]
pub trait AnalysisCheck: Send + Sync {
    /// Stable check identifier (e.g. "tool-yaml-valid").
    fn id(&self) -> &'static str;

    /// Human-readable title for progress display.
    fn title(&self) -> &'static str;

    /// Whether a failure halts the pipeline.
    fn required(&self) -> bool;

    /// Fixed progress checkpoint reached once this check finishes.
    fn progress(&self) -> u8;

    /// Ids of checks that must have completed first. Declared order already
    /// guarantees this; the list is documentation.
    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    async fn execute(&self, ctx: &CheckContext<'_>, snapshot: &AnalysisState) -> CheckOutcome;
}
