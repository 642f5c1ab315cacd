//! Analysis state: the single mutable record threaded through the pipeline.
//!
//! Exclusively owned and mutated by the runner. Checks receive a cloned
//! snapshot and hand back a [`CheckOutcome`]; the runner's merge step is the
//! only writer, which keeps the state race-free by construction.

use indexmap::IndexMap;
use serde::Serialize;

use crate::citation::CitationCff;
use crate::github::RepoInfo;
use crate::metadata::{LicenseInfo, UnifiedSoftwareMetadata};
use crate::toolspec::ToolSpec;

/// Lifecycle of one analysis run. Completed, Error and Cancelled are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Idle,
    Analyzing,
    Completed,
    Error,
    Cancelled,
}

/// Status of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

/// Immutable-once-finalized record of a check's execution.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub id: String,
    pub title: String,
    pub status: CheckStatus,
    /// Fixed at declaration; a failure of a required check halts the run.
    pub required: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub duration_ms: Option<u64>,
}

impl CheckResult {
    pub fn pending(id: &str, title: &str, required: bool) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            status: CheckStatus::Pending,
            required,
            error: None,
            warning: None,
            duration_ms: None,
        }
    }
}

/// Typed artifact a check hands back for the runner to merge into state.
#[derive(Debug, Clone)]
pub enum CheckArtifact {
    Repo(RepoInfo),
    ToolYamlPath(String),
    ToolSpec(ToolSpec),
    Citation(CitationCff),
    License(LicenseInfo),
    Metadata(Box<UnifiedSoftwareMetadata>),
}

/// What a check executor returns. Provider failures are converted into a
/// non-success outcome with the message preserved, never propagated as a
/// panic or error value.
#[derive(Debug, Clone, Default)]
pub struct CheckOutcome {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub artifact: Option<CheckArtifact>,
}

impl CheckOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![message.into()],
            ..Default::default()
        }
    }

    pub fn with_artifact(mut self, artifact: CheckArtifact) -> Self {
        self.artifact = Some(artifact);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Shared analysis state. Checks read a snapshot; only the runner writes.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisState {
    pub status: AnalysisStatus,
    pub repo_url: String,
    pub repo_info: Option<RepoInfo>,
    /// Mapping from check id to result, insertion order = declared pipeline
    /// order; seeded as pending before execution begins.
    pub checks: IndexMap<String, CheckResult>,
    pub tool_yaml_path: Option<String>,
    pub tool_spec: Option<ToolSpec>,
    pub citation: Option<CitationCff>,
    pub license: Option<LicenseInfo>,
    pub metadata: Option<UnifiedSoftwareMetadata>,
    /// Append-only, ordered across all checks.
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Coarse checkpoint percentage, fixed per check.
    pub progress: u8,
}

impl AnalysisState {
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Idle,
            repo_url: repo_url.into(),
            repo_info: None,
            checks: IndexMap::new(),
            tool_yaml_path: None,
            tool_spec: None,
            citation: None,
            license: None,
            metadata: None,
            warnings: Vec::new(),
            errors: Vec::new(),
            progress: 0,
        }
    }

    /// Whether the run ended in a state that allows a retry.
    pub fn can_retry(&self) -> bool {
        matches!(self.status, AnalysisStatus::Error | AnalysisStatus::Cancelled)
    }

    pub fn check(&self, id: &str) -> Option<&CheckResult> {
        self.checks.get(id)
    }
}
