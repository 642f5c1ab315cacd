//! Metadata exporters.
//!
//! Each exporter is a pure mapping from the unified metadata record (plus
//! optional format-specific configuration) to a serialized string, with its
//! own validation rules layered on a shared baseline. `validate()` reports
//! soft issues the caller may choose to proceed past; `export()` only fails
//! on hard preconditions and serialization faults.

pub mod codemeta;
pub mod command;
pub mod cwl;
pub mod doap;
pub mod galaxy;
pub mod licenses;
pub mod schema_org;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::metadata::UnifiedSoftwareMetadata;

pub use codemeta::CodeMetaExporter;
pub use cwl::{CwlConfig, CwlExporter, CwlOutput, CwlVersion};
pub use doap::{DoapConfig, DoapExporter, RdfFormat};
pub use galaxy::{GalaxyConfig, GalaxyExporter, GalaxyOutput};
pub use schema_org::SchemaOrgExporter;

/// The supported interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Codemeta,
    Schemaorg,
    Galaxy,
    Cwl,
    Doap,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Codemeta => write!(f, "codemeta"),
            ExportFormat::Schemaorg => write!(f, "schemaorg"),
            ExportFormat::Galaxy => write!(f, "galaxy"),
            ExportFormat::Cwl => write!(f, "cwl"),
            ExportFormat::Doap => write!(f, "doap"),
        }
    }
}

impl ExportFormat {
    pub fn all() -> &'static [ExportFormat] {
        &[
            ExportFormat::Codemeta,
            ExportFormat::Schemaorg,
            ExportFormat::Galaxy,
            ExportFormat::Cwl,
            ExportFormat::Doap,
        ]
    }

    /// Canonical default filename for an exported document.
    pub fn default_filename(&self, tool_name: &str) -> String {
        let slug = slugify(tool_name);
        match self {
            ExportFormat::Codemeta => format!("{slug}.codemeta.json"),
            ExportFormat::Schemaorg => format!("{slug}.schemaorg.json"),
            ExportFormat::Galaxy => format!("{slug}.xml"),
            ExportFormat::Cwl => format!("{slug}.cwl"),
            ExportFormat::Doap => format!("{slug}.ttl"),
        }
    }
}

/// One exporter per target format. Pure with respect to the metadata record.
pub trait Exporter {
    type Config;

    fn format(&self) -> ExportFormat;

    /// Soft validation: issues the caller may ignore.
    fn validate(&self, meta: &UnifiedSoftwareMetadata, config: &Self::Config) -> Vec<String>;

    /// Serialize the record. Does not enforce `validate()`'s rules.
    fn export(
        &self,
        meta: &UnifiedSoftwareMetadata,
        config: &Self::Config,
    ) -> Result<String, ExportError>;
}

/// Baseline rules every format shares: a name, a description and at least
/// one author.
pub fn baseline_issues(meta: &UnifiedSoftwareMetadata) -> Vec<String> {
    let mut issues = Vec::new();
    if meta.name.trim().is_empty() {
        issues.push("Metadata is missing a tool name".to_string());
    }
    if meta.description.trim().is_empty() {
        issues.push("Metadata is missing a description".to_string());
    }
    if meta.authors.is_empty() {
        issues.push("Metadata does not list any author".to_string());
    }
    issues
}

pub(crate) fn slugify(name: &str) -> String {
    let mut slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "tool".to_string()
    } else {
        trimmed.to_string()
    }
}
