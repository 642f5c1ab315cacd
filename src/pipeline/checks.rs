//! The canonical analysis checks, in required order.
//!
//! Order is the dependency order: repository resolution feeds every later
//! check, tool.yml existence feeds validity, and the terminal conversion
//! check consumes everything accumulated before it.

use async_trait::async_trait;

use crate::citation::{compare_licenses, parse_citation};
use crate::error::ProviderError;
use crate::export::command::extract_dockerfile_command;
use crate::metadata::{LicenseInfo, build_unified_metadata};
use crate::pipeline::check::{AnalysisCheck, CheckContext};
use crate::pipeline::state::{AnalysisState, CheckArtifact, CheckOutcome};
use crate::toolspec::validate_tool_yaml;

/// Paths probed for the tool manifest, in order.
const TOOL_YAML_CANDIDATES: &[&str] = &["src/tool.yml", "tool.yml"];

/// Paths probed for the license file, in order.
const LICENSE_CANDIDATES: &[&str] = &["LICENSE", "LICENSE.md", "LICENSE.txt"];

/// The declared pipeline, in execution order.
pub fn canonical_checks() -> Vec<Box<dyn AnalysisCheck>> {
    vec![
        Box::new(RepoExistsCheck),
        Box::new(ToolYamlExistsCheck),
        Box::new(ToolYamlValidCheck),
        Box::new(CitationCffCheck),
        Box::new(LicenseCheck),
        Box::new(MetadataConversionCheck),
    ]
}

fn provider_failure(err: ProviderError) -> CheckOutcome {
    tracing::warn!(category = err.category(), error = %err, "check provider call failed");
    CheckOutcome::failed(err.to_string())
}

/// Resolves the repository identifier into a descriptor.
pub struct RepoExistsCheck;

#[async_trait]
impl AnalysisCheck for RepoExistsCheck {
    fn id(&self) -> &'static str {
        "repo-exists"
    }

    fn title(&self) -> &'static str {
        "Repository exists and is accessible"
    }

    fn required(&self) -> bool {
        true
    }

    fn progress(&self) -> u8 {
        10
    }

    async fn execute(&self, ctx: &CheckContext<'_>, _snapshot: &AnalysisState) -> CheckOutcome {
        match ctx.provider.resolve_repo(ctx.repo_url).await {
            Ok(repo) => {
                tracing::info!(repo = %repo.full_name, "repository resolved");
                CheckOutcome::ok().with_artifact(CheckArtifact::Repo(repo))
            }
            Err(ProviderError::NotFound(subject)) => CheckOutcome::failed(format!(
                "Repository '{subject}' was not found or is not publicly accessible"
            )),
            Err(other) => provider_failure(other),
        }
    }
}

/// Probes for the tool manifest at its conventional locations.
pub struct ToolYamlExistsCheck;

#[async_trait]
impl AnalysisCheck for ToolYamlExistsCheck {
    fn id(&self) -> &'static str {
        "tool-yaml-exists"
    }

    fn title(&self) -> &'static str {
        "tool.yml file exists"
    }

    fn required(&self) -> bool {
        true
    }

    fn progress(&self) -> u8 {
        25
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["repo-exists"]
    }

    async fn execute(&self, ctx: &CheckContext<'_>, snapshot: &AnalysisState) -> CheckOutcome {
        let Some(repo) = snapshot.repo_info.as_ref() else {
            return CheckOutcome::failed("repository information is not available");
        };

        for candidate in TOOL_YAML_CANDIDATES {
            match ctx.provider.file_exists(repo, candidate).await {
                Ok(true) => {
                    return CheckOutcome::ok()
                        .with_artifact(CheckArtifact::ToolYamlPath(candidate.to_string()));
                }
                Ok(false) => {}
                Err(err) => return provider_failure(err),
            }
        }

        CheckOutcome::failed(
            "tool.yml file is missing (expected at src/tool.yml or the repository root)",
        )
    }
}

/// Fetches and structurally validates the tool manifest.
pub struct ToolYamlValidCheck;

#[async_trait]
impl AnalysisCheck for ToolYamlValidCheck {
    fn id(&self) -> &'static str {
        "tool-yaml-valid"
    }

    fn title(&self) -> &'static str {
        "tool.yml is structurally valid"
    }

    fn required(&self) -> bool {
        true
    }

    fn progress(&self) -> u8 {
        45
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["tool-yaml-exists"]
    }

    async fn execute(&self, ctx: &CheckContext<'_>, snapshot: &AnalysisState) -> CheckOutcome {
        let Some(repo) = snapshot.repo_info.as_ref() else {
            return CheckOutcome::failed("repository information is not available");
        };
        let Some(path) = snapshot.tool_yaml_path.as_deref() else {
            return CheckOutcome::failed("tool.yml location is not available");
        };

        let yaml = match ctx.provider.fetch_file(repo, path).await {
            Ok(text) => text,
            Err(err) => return provider_failure(err),
        };

        let validation = validate_tool_yaml(&yaml);
        let mut outcome = CheckOutcome {
            success: validation.is_valid,
            errors: validation.errors,
            warnings: validation.warnings,
            artifact: None,
        };
        if let Some(spec) = validation.tool_spec {
            tracing::info!(tool = %spec.name, parameters = spec.parameters.len(), "tool.yml validated");
            outcome.artifact = Some(CheckArtifact::ToolSpec(spec));
        }
        outcome
    }
}

/// Optional: CITATION.cff existence and validity.
pub struct CitationCffCheck;

#[async_trait]
impl AnalysisCheck for CitationCffCheck {
    fn id(&self) -> &'static str {
        "citation-cff-exists"
    }

    fn title(&self) -> &'static str {
        "CITATION.cff exists and is valid"
    }

    fn required(&self) -> bool {
        false
    }

    fn progress(&self) -> u8 {
        60
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["repo-exists"]
    }

    async fn execute(&self, ctx: &CheckContext<'_>, snapshot: &AnalysisState) -> CheckOutcome {
        let Some(repo) = snapshot.repo_info.as_ref() else {
            return CheckOutcome::failed("repository information is not available");
        };

        match ctx.provider.file_exists(repo, "CITATION.cff").await {
            Ok(true) => {}
            Ok(false) => {
                let mut outcome = CheckOutcome::failed(
                    "CITATION.cff file is missing. Citation metadata will not be included.",
                );
                outcome.warnings = outcome.errors.clone();
                return outcome;
            }
            Err(err) => return provider_failure(err),
        }

        let text = match ctx.provider.fetch_file(repo, "CITATION.cff").await {
            Ok(text) => text,
            Err(err) => return provider_failure(err),
        };

        let validation = parse_citation(&text);
        let mut outcome = CheckOutcome {
            success: validation.is_valid,
            errors: validation.errors,
            warnings: validation.warnings,
            artifact: None,
        };
        if let Some(citation) = validation.citation {
            outcome.artifact = Some(CheckArtifact::Citation(citation));
        }
        outcome
    }
}

/// Optional: LICENSE presence and best-effort comparison against the
/// citation's declared license. Missing files complete with a warning.
pub struct LicenseCheck;

#[async_trait]
impl AnalysisCheck for LicenseCheck {
    fn id(&self) -> &'static str {
        "license-check"
    }

    fn title(&self) -> &'static str {
        "LICENSE file exists and matches the citation"
    }

    fn required(&self) -> bool {
        false
    }

    fn progress(&self) -> u8 {
        75
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["repo-exists"]
    }

    async fn execute(&self, ctx: &CheckContext<'_>, snapshot: &AnalysisState) -> CheckOutcome {
        let Some(repo) = snapshot.repo_info.as_ref() else {
            return CheckOutcome::failed("repository information is not available");
        };

        let mut content = None;
        for candidate in LICENSE_CANDIDATES {
            match ctx.provider.file_exists(repo, candidate).await {
                Ok(true) => match ctx.provider.fetch_file(repo, candidate).await {
                    Ok(text) => {
                        content = Some(text);
                        break;
                    }
                    Err(err) => return provider_failure(err),
                },
                Ok(false) => {}
                Err(err) => return provider_failure(err),
            }
        }

        let declared = snapshot
            .citation
            .as_ref()
            .and_then(|c| c.license.as_deref());
        let comparison = compare_licenses(declared, content.as_deref());
        if !comparison.compatible {
            tracing::warn!("citation license does not match the LICENSE file");
        }

        let exists = content.is_some();
        let mut outcome = CheckOutcome::ok().with_artifact(CheckArtifact::License(LicenseInfo {
            exists,
            content,
        }));
        if !exists {
            outcome.warnings.push(
                "LICENSE file is missing. An explicit license makes reuse possible.".to_string(),
            );
        }
        outcome.warnings.extend(comparison.warnings);
        outcome
    }
}

/// Terminal required check: reconciles everything into the unified record.
pub struct MetadataConversionCheck;

#[async_trait]
impl AnalysisCheck for MetadataConversionCheck {
    fn id(&self) -> &'static str {
        "metadata-conversion"
    }

    fn title(&self) -> &'static str {
        "Unified metadata conversion"
    }

    fn required(&self) -> bool {
        true
    }

    fn progress(&self) -> u8 {
        100
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["tool-yaml-valid", "citation-cff-exists", "license-check"]
    }

    async fn execute(&self, ctx: &CheckContext<'_>, snapshot: &AnalysisState) -> CheckOutcome {
        let Some(repo) = snapshot.repo_info.as_ref() else {
            return CheckOutcome::failed("repository information is not available");
        };

        // Best-effort Dockerfile probe to prefill the Galaxy command
        // scaffold; any failure leaves the scaffold empty.
        let dockerfile_cmd = match ctx.provider.file_exists(repo, "Dockerfile").await {
            Ok(true) => match ctx.provider.fetch_file(repo, "Dockerfile").await {
                Ok(text) => extract_dockerfile_command(&text),
                Err(_) => None,
            },
            _ => None,
        };

        match build_unified_metadata(
            snapshot.repo_info.as_ref(),
            snapshot.tool_spec.as_ref(),
            snapshot.citation.as_ref(),
            snapshot.license.as_ref(),
            dockerfile_cmd.as_deref(),
            ctx.release_tag,
        ) {
            Ok(metadata) => {
                CheckOutcome::ok().with_artifact(CheckArtifact::Metadata(Box::new(metadata)))
            }
            Err(err) => CheckOutcome::failed(err.to_string()),
        }
    }
}
