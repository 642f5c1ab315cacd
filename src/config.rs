//! Configuration resolution: CLI flags layered over an optional config file
//! layered over defaults, validated fail-fast.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::{CwlVersion, ExportFormat, RdfFormat};
use crate::github::DEFAULT_API_BASE;

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "toolspec-audit",
    about = "Analyze a repository for tool-spec compliance and export its metadata",
    version
)]
pub struct CliArgs {
    /// Repository to analyze: URL, git@ SSH form, or owner/name
    #[arg(value_name = "REPO")]
    pub repo: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "TOOLSPEC_AUDIT_GITHUB_API",
        value_name = "URL",
        help = "Base URL of the repository content API"
    )]
    pub github_api: Option<String>,

    #[arg(
        long,
        env = "GITHUB_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        help = "Bearer token passed through to the content API"
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "format",
        value_enum,
        value_name = "FORMAT",
        value_delimiter = ',',
        help = "Export formats to produce (default: all)"
    )]
    pub formats: Option<Vec<ExportFormat>>,

    #[arg(
        long,
        env = "TOOLSPEC_AUDIT_OUTPUT_DIR",
        value_name = "DIR",
        help = "Directory the exported documents are written to"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "TAG",
        help = "Explicit repository release tag used as the metadata version"
    )]
    pub release_tag: Option<String>,

    #[arg(
        long,
        value_name = "CMD",
        help = "Galaxy/CWL command override (defaults to the Dockerfile command)"
    )]
    pub command: Option<String>,

    #[arg(
        long,
        value_name = "IMAGE",
        help = "Container image override for Galaxy and CWL export"
    )]
    pub container: Option<String>,

    #[arg(
        long,
        value_enum,
        value_name = "VERSION",
        help = "CWL document version"
    )]
    pub cwl_version: Option<CwlVersion>,

    #[arg(
        long,
        value_enum,
        value_name = "FORMAT",
        help = "DOAP serialization format"
    )]
    pub rdf_format: Option<RdfFormat>,

    #[arg(long, value_name = "NAME", help = "DOAP maintainer override")]
    pub maintainer: Option<String>,

    #[arg(long, help = "Print the declared check plan and exit")]
    pub list_checks: bool,
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub repo: Option<String>,
    pub github_api: String,
    pub github_token: Option<String>,
    pub formats: Vec<ExportFormat>,
    pub output_dir: PathBuf,
    pub release_tag: Option<String>,
    pub command: Option<String>,
    pub container: Option<String>,
    pub cwl_version: CwlVersion,
    pub rdf_format: RdfFormat,
    pub maintainer: Option<String>,
    pub list_checks: bool,
}

impl AuditConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            repo,
            config,
            github_api: cli_github_api,
            github_token: cli_github_token,
            formats: cli_formats,
            output_dir: cli_output_dir,
            release_tag: cli_release_tag,
            command: cli_command,
            container: cli_container,
            cwl_version: cli_cwl_version,
            rdf_format: cli_rdf_format,
            maintainer: cli_maintainer,
            list_checks,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            github_api: file_github_api,
            github_token: file_github_token,
            formats: file_formats,
            output_dir: file_output_dir,
            release_tag: file_release_tag,
            command: file_command,
            container: file_container,
            cwl_version: file_cwl_version,
            rdf_format: file_rdf_format,
            maintainer: file_maintainer,
        } = file_config;

        let github_api = cli_github_api
            .or(file_github_api)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        anyhow::ensure!(
            github_api.starts_with("http://") || github_api.starts_with("https://"),
            "content API base {github_api:?} must be an http(s) URL"
        );

        let mut formats = cli_formats
            .or(file_formats)
            .unwrap_or_else(|| ExportFormat::all().to_vec());
        formats.dedup();
        anyhow::ensure!(!formats.is_empty(), "at least one export format is required");

        let resolved = Self {
            repo,
            github_api,
            github_token: cli_github_token.or(file_github_token),
            formats,
            output_dir: cli_output_dir
                .or(file_output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            release_tag: cli_release_tag.or(file_release_tag),
            command: cli_command.or(file_command),
            container: cli_container.or(file_container),
            cwl_version: cli_cwl_version.or(file_cwl_version).unwrap_or_default(),
            rdf_format: cli_rdf_format.or(file_rdf_format).unwrap_or_default(),
            maintainer: cli_maintainer.or(file_maintainer),
            list_checks,
        };

        if !resolved.list_checks {
            anyhow::ensure!(
                resolved.repo.is_some(),
                "a repository identifier is required (URL, git@ form, or owner/name)"
            );
        }

        Ok(resolved)
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    github_api: Option<String>,
    github_token: Option<String>,
    formats: Option<Vec<ExportFormat>>,
    output_dir: Option<PathBuf>,
    release_tag: Option<String>,
    command: Option<String>,
    container: Option<String>,
    cwl_version: Option<CwlVersion>,
    rdf_format: Option<RdfFormat>,
    maintainer: Option<String>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_resolve_without_flags() {
        let config = AuditConfig::from_args(CliArgs {
            repo: Some("owner/repo".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.github_api, DEFAULT_API_BASE);
        assert_eq!(config.formats, ExportFormat::all().to_vec());
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.cwl_version, CwlVersion::V1_2);
        assert_eq!(config.rdf_format, RdfFormat::Turtle);
    }

    #[test]
    fn repo_is_required_unless_listing_checks() {
        assert!(AuditConfig::from_args(CliArgs::default()).is_err());
        assert!(
            AuditConfig::from_args(CliArgs {
                list_checks: true,
                ..Default::default()
            })
            .is_ok()
        );
    }

    #[test]
    fn cli_layers_over_config_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "github_api: https://ghe.example.org/api/v3").unwrap();
        writeln!(file, "release_tag: v1.0.0").unwrap();

        let config = AuditConfig::from_args(CliArgs {
            repo: Some("owner/repo".into()),
            config: Some(file.path().to_path_buf()),
            release_tag: Some("v2.0.0".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.github_api, "https://ghe.example.org/api/v3");
        // CLI wins over file
        assert_eq!(config.release_tag.as_deref(), Some("v2.0.0"));
    }

    #[test]
    fn rejects_non_http_api_base() {
        let result = AuditConfig::from_args(CliArgs {
            repo: Some("owner/repo".into()),
            github_api: Some("ftp://example.org".into()),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
