//! Galaxy tool XML export.
//!
//! Generates a tool-definition document with a fixed element ordering:
//! description, help, command, inputs, outputs, requirements, citations,
//! stdio. Every piece of text inserted into markup is escaped for the five
//! XML metacharacters. `validate()` requires a command; `export()`
//! deliberately does not enforce that and emits an empty `<command>`
//! element instead, because users routinely hand-edit the generated file.

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::export::command::detect_interpreter;
use crate::export::{Exporter, ExportFormat, baseline_issues, slugify};
use crate::metadata::UnifiedSoftwareMetadata;
use crate::toolspec::{DataDef, ParameterDef, ParameterType, ToolData};

/// Export-time configuration. A prefilled scaffold lives on the unified
/// metadata record; callers pass their edited copy here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    pub command: String,
    pub container: String,
    pub container_version: String,
    pub outputs: Vec<GalaxyOutput>,
    pub profile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalaxyOutput {
    pub name: String,
    pub format: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Fixed extension-to-datatype table; unknown extensions fall back to the
/// generic `data` type.
const DATATYPE_TABLE: &[(&str, &str)] = &[
    ("csv", "csv"),
    ("tsv", "tabular"),
    ("tab", "tabular"),
    ("txt", "txt"),
    ("json", "json"),
    ("yml", "yaml"),
    ("yaml", "yaml"),
    ("xml", "xml"),
    ("tif", "tiff"),
    ("tiff", "tiff"),
    ("png", "png"),
    ("jpg", "jpg"),
    ("nc", "netcdf"),
    ("h5", "h5"),
    ("hdf5", "h5"),
    ("fasta", "fasta"),
    ("fastq", "fastqsanger"),
    ("pdf", "pdf"),
    ("html", "html"),
    ("zip", "zip"),
];

pub fn galaxy_datatype(extension: &str) -> &'static str {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    DATATYPE_TABLE
        .iter()
        .find(|(key, _)| *key == ext)
        .map(|(_, datatype)| *datatype)
        .unwrap_or("data")
}

pub struct GalaxyExporter;

impl Exporter for GalaxyExporter {
    type Config = Option<GalaxyConfig>;

    fn format(&self) -> ExportFormat {
        ExportFormat::Galaxy
    }

    fn validate(&self, meta: &UnifiedSoftwareMetadata, config: &Self::Config) -> Vec<String> {
        let mut issues = baseline_issues(meta);
        match config {
            None => issues.push("Galaxy export requires a configuration".to_string()),
            Some(config) if config.command.trim().is_empty() => {
                issues.push("Command is required for Galaxy export".to_string());
            }
            Some(_) => {}
        }
        // Empty outputs are accepted: the generated file is a starting
        // point the user is expected to edit.
        issues
    }

    fn export(
        &self,
        meta: &UnifiedSoftwareMetadata,
        config: &Self::Config,
    ) -> Result<String, ExportError> {
        let config = config.as_ref().ok_or(ExportError::MissingConfig {
            format: "Galaxy",
        })?;

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<tool id=\"{}\" name=\"{}\" version=\"{}\" profile=\"{}\">\n",
            escape_xml(&slugify(&meta.name)),
            escape_xml(&meta.name),
            escape_xml(&meta.version),
            escape_xml(&config.profile),
        ));

        xml.push_str(&format!(
            "  <description>{}</description>\n",
            escape_xml(&short_description(&meta.description))
        ));
        xml.push_str(&format!(
            "  <help>{}</help>\n",
            escape_xml(&meta.description)
        ));
        xml.push_str(&format!(
            "  <command>{}</command>\n",
            escape_xml(&config.command)
        ));

        write_inputs(&mut xml, meta);
        write_outputs(&mut xml, config);
        write_requirements(&mut xml, config);
        write_citations(&mut xml, meta);

        xml.push_str("  <stdio>\n");
        xml.push_str("    <exit_code range=\"1:\" level=\"fatal\"/>\n");
        xml.push_str("  </stdio>\n");
        xml.push_str("</tool>\n");

        Ok(xml)
    }
}

/// First sentence of the description, or the first 100 characters when no
/// sentence terminator exists.
fn short_description(description: &str) -> String {
    let trimmed = description.trim();
    if let Some(idx) = trimmed.find(['.', '!', '?']) {
        trimmed[..idx].trim().to_string()
    } else {
        trimmed.chars().take(100).collect()
    }
}

fn write_inputs(xml: &mut String, meta: &UnifiedSoftwareMetadata) {
    xml.push_str("  <inputs>\n");

    // Declared data items first, in declaration order.
    match &meta.tool.data {
        ToolData::Entries(entries) => {
            for (name, def) in entries {
                xml.push_str(&data_input(name, def));
            }
        }
        ToolData::Names(names) => {
            for name in names {
                xml.push_str(&data_input(name, &DataDef::default()));
            }
        }
    }

    for (name, def) in &meta.tool.parameters {
        xml.push_str(&parameter_input(name, def));
    }

    xml.push_str("  </inputs>\n");
}

fn data_input(name: &str, def: &DataDef) -> String {
    let format = def
        .extension
        .first()
        .map(|ext| galaxy_datatype(ext))
        .unwrap_or("data");
    let label = def.description.as_deref().unwrap_or(name);
    format!(
        "    <param name=\"{}\" type=\"data\" format=\"{}\" label=\"{}\"/>\n",
        escape_xml(name),
        escape_xml(format),
        escape_xml(label),
    )
}

fn parameter_input(name: &str, def: &ParameterDef) -> String {
    let label = def.description.as_deref().unwrap_or(name);
    let mut attrs = format!(
        "name=\"{}\" type=\"{}\"",
        escape_xml(name),
        galaxy_param_type(def.kind)
    );

    if def.kind == ParameterType::Asset {
        attrs.push_str(" format=\"data\"");
    }
    if let Some(default) = def.default.as_ref().and_then(yaml_scalar) {
        attrs.push_str(&format!(" value=\"{}\"", escape_xml(&default)));
    }
    if let Some(min) = def.min {
        attrs.push_str(&format!(" min=\"{min}\""));
    }
    if let Some(max) = def.max {
        attrs.push_str(&format!(" max=\"{max}\""));
    }
    if def.optional {
        attrs.push_str(" optional=\"true\"");
    }
    if def.array {
        attrs.push_str(" multiple=\"true\"");
    }
    attrs.push_str(&format!(" label=\"{}\"", escape_xml(label)));

    if def.kind == ParameterType::Enum {
        let mut element = format!("    <param {attrs}>\n");
        for value in &def.values {
            element.push_str(&format!(
                "      <option value=\"{0}\">{0}</option>\n",
                escape_xml(value)
            ));
        }
        element.push_str("    </param>\n");
        element
    } else {
        format!("    <param {attrs}/>\n")
    }
}

fn galaxy_param_type(kind: ParameterType) -> &'static str {
    match kind {
        ParameterType::String => "text",
        ParameterType::Integer => "integer",
        ParameterType::Float => "float",
        ParameterType::Boolean => "boolean",
        ParameterType::Enum => "select",
        ParameterType::Asset => "data",
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn write_outputs(xml: &mut String, config: &GalaxyConfig) {
    xml.push_str("  <outputs>\n");
    for output in &config.outputs {
        let label = output.label.as_deref().unwrap_or(&output.name);
        xml.push_str(&format!(
            "    <data name=\"{}\" format=\"{}\" label=\"{}\"/>\n",
            escape_xml(&output.name),
            escape_xml(&output.format),
            escape_xml(label),
        ));
    }
    xml.push_str("  </outputs>\n");
}

fn write_requirements(xml: &mut String, config: &GalaxyConfig) {
    xml.push_str("  <requirements>\n");
    if !config.container.trim().is_empty() {
        let image = container_reference(config);
        xml.push_str(&format!(
            "    <container type=\"docker\">{}</container>\n",
            escape_xml(&image)
        ));
    }
    if let Some(package) = detect_interpreter(&config.command) {
        xml.push_str(&format!(
            "    <requirement type=\"package\">{package}</requirement>\n"
        ));
    }
    xml.push_str("  </requirements>\n");
}

// The scaffold container already carries a tag; only untagged references
// get the configured version appended.
fn container_reference(config: &GalaxyConfig) -> String {
    let name = config.container.trim();
    let tagged = name
        .rsplit('/')
        .next()
        .is_some_and(|last| last.contains(':'));
    if tagged || config.container_version.trim().is_empty() {
        name.to_string()
    } else {
        format!("{name}:{}", config.container_version.trim())
    }
}

fn write_citations(xml: &mut String, meta: &UnifiedSoftwareMetadata) {
    xml.push_str("  <citations>\n");
    if !meta.authors.is_empty() {
        let names: Vec<String> = meta.authors.iter().map(|a| a.display_name()).collect();
        let bibtex = format!(
            "@software{{{key},\n  author = {{{authors}}},\n  title = {{{title}}},\n  url = {{{url}}},\n  version = {{{version}}}\n}}",
            key = slugify(&meta.name),
            authors = names.join(" and "),
            title = meta.name,
            url = meta.repository.html_url,
            version = meta.version,
        );
        xml.push_str(&format!(
            "    <citation type=\"bibtex\">{}</citation>\n",
            escape_xml(&bibtex)
        ));
    }
    xml.push_str("  </citations>\n");
}

/// Escape the five XML metacharacters. Ampersand first.
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
