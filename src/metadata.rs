//! Unified software metadata: the single canonical record every exporter
//! consumes.
//!
//! Built exactly once, when the pipeline's terminal metadata-conversion
//! check succeeds. Immutable afterwards; export-time configuration edits are
//! passed per call as overrides and never written back here.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::citation::{Author, CitationCff};
use crate::error::MetadataError;
use crate::export::galaxy::GalaxyConfig;
use crate::github::RepoInfo;
use crate::toolspec::ToolSpec;

pub const GENERATOR: &str = concat!("toolspec-audit ", env!("CARGO_PKG_VERSION"));

/// Presence and (truncated) content of the repository's LICENSE file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LicenseInfo {
    pub exists: bool,
    pub content: Option<String>,
}

/// The canonical metadata record merging all validated sources.
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedSoftwareMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub authors: Vec<Author>,
    pub keywords: Vec<String>,
    pub repository: RepoInfo,
    /// Declared license, taken from CITATION.cff only. File-content
    /// inference never resolves a license value, it only warns.
    pub license: Option<String>,
    pub license_file: LicenseInfo,
    pub tool: ToolSpec,
    pub generated_at: String,
    pub generator: &'static str,
    /// Starting values for Galaxy export, not authoritative: exporters take
    /// per-call overrides.
    pub galaxy_defaults: GalaxyConfig,
}

/// Reconcile the pipeline's accumulated artifacts into one record.
///
/// Fails only when `repo` or `tool_spec` is absent; the pipeline's
/// required-check gating guarantees both by the time this runs.
pub fn build_unified_metadata(
    repo: Option<&RepoInfo>,
    tool_spec: Option<&ToolSpec>,
    citation: Option<&CitationCff>,
    license: Option<&LicenseInfo>,
    dockerfile_cmd: Option<&str>,
    repo_version: Option<&str>,
) -> Result<UnifiedSoftwareMetadata, MetadataError> {
    let repo = repo.ok_or(MetadataError::MissingRepoInfo)?;
    let tool_spec = tool_spec.ok_or(MetadataError::MissingToolSpec)?;

    let name = if tool_spec.title.trim().is_empty() {
        repo.name.clone()
    } else {
        tool_spec.title.clone()
    };

    let description = if !tool_spec.description.trim().is_empty() {
        tool_spec.description.clone()
    } else {
        repo.description.clone().unwrap_or_default()
    };

    let version = repo_version
        .map(str::to_string)
        .or_else(|| citation.and_then(|c| c.version.clone()))
        .unwrap_or_else(|| "latest".to_string());

    // Author fabrication from the repository owner is deliberately not done
    // here; only the DOAP maintainer fallback resolves that far.
    let authors = citation.map(|c| c.authors.clone()).unwrap_or_default();

    let mut keywords: Vec<String> = Vec::new();
    let mut push_keyword = |candidate: String| {
        if !candidate.is_empty() && !keywords.contains(&candidate) {
            keywords.push(candidate);
        }
    };
    if !tool_spec.parameters.is_empty() {
        push_keyword("tool-spec".to_string());
    }
    if let Some(citation) = citation {
        for keyword in &citation.keywords {
            push_keyword(keyword.clone());
        }
    }
    if let Some(language) = repo.language.as_deref() {
        push_keyword(language.to_lowercase());
    }

    let galaxy_defaults = GalaxyConfig {
        command: dockerfile_cmd.unwrap_or_default().to_string(),
        container: format!(
            "ghcr.io/{}/{}:latest",
            repo.owner.to_lowercase(),
            repo.name.to_lowercase()
        ),
        container_version: "latest".to_string(),
        outputs: Vec::new(),
        profile: "24.0".to_string(),
    };

    Ok(UnifiedSoftwareMetadata {
        name,
        description,
        version,
        authors,
        keywords,
        repository: repo.clone(),
        license: citation.and_then(|c| c.license.clone()),
        license_file: license.cloned().unwrap_or_default(),
        tool: tool_spec.clone(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        generator: GENERATOR,
        galaxy_defaults,
    })
}
