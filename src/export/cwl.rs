//! CWL CommandLineTool export.
//!
//! The underlying tool reads its parameters from a generated inputs file
//! rather than positional arguments, so inputs carry no command-line
//! binding. The exporter synthesizes a shell sequence that materializes
//! `inputs.json` from runtime-evaluated parameter references and then runs
//! the containerized tool with the conventional `/in` and `/out` mount
//! points and a `TOOL_RUN` environment variable naming the tool.
//!
//! Metadata embedding differs by CWL version: v1.2 attaches
//! author/version/license through a schema.org-namespaced extension block;
//! v1.1 lacks namespace support and appends the same information as plain
//! text to the documentation field.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::ExportError;
use crate::export::{Exporter, ExportFormat, baseline_issues, slugify};
use crate::metadata::UnifiedSoftwareMetadata;
use crate::toolspec::{ParameterDef, ParameterType, ToolData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum CwlVersion {
    #[serde(rename = "v1.1")]
    #[value(name = "v1.1")]
    V1_1,
    #[default]
    #[serde(rename = "v1.2")]
    #[value(name = "v1.2")]
    V1_2,
}

impl CwlVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            CwlVersion::V1_1 => "v1.1",
            CwlVersion::V1_2 => "v1.2",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CwlConfig {
    pub cwl_version: CwlVersion,
    pub outputs: Vec<CwlOutput>,
    pub base_command: Option<String>,
    pub container: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CwlOutput {
    pub name: String,
    /// Glob below the outputs directory; the output name when omitted.
    #[serde(default)]
    pub glob: Option<String>,
}

pub struct CwlExporter;

impl Exporter for CwlExporter {
    type Config = CwlConfig;

    fn format(&self) -> ExportFormat {
        ExportFormat::Cwl
    }

    fn validate(&self, meta: &UnifiedSoftwareMetadata, config: &CwlConfig) -> Vec<String> {
        let mut issues = baseline_issues(meta);
        let has_inputs = !meta.tool.parameters.is_empty() || !meta.tool.data.is_empty();
        if !has_inputs && config.outputs.is_empty() {
            issues.push("CWL export requires at least one input or output".to_string());
        }
        issues
    }

    fn export(
        &self,
        meta: &UnifiedSoftwareMetadata,
        config: &CwlConfig,
    ) -> Result<String, ExportError> {
        let mut doc = Mapping::new();
        doc.insert(
            Value::from("cwlVersion"),
            Value::from(config.cwl_version.as_str()),
        );
        doc.insert(Value::from("class"), Value::from("CommandLineTool"));
        doc.insert(Value::from("label"), Value::from(meta.name.clone()));

        let mut documentation = meta.description.clone();
        if config.cwl_version == CwlVersion::V1_1 {
            documentation.push_str(&plain_text_metadata(meta));
        }
        doc.insert(Value::from("doc"), Value::from(documentation));

        let base_command: Vec<Value> = config
            .base_command
            .as_deref()
            .unwrap_or("sh")
            .split_whitespace()
            .map(Value::from)
            .collect();
        doc.insert(Value::from("baseCommand"), Value::Sequence(base_command));
        doc.insert(
            Value::from("arguments"),
            Value::Sequence(vec![Value::from("-c"), Value::from(shell_sequence(meta, config))]),
        );

        doc.insert(Value::from("inputs"), inputs_block(meta));
        doc.insert(Value::from("outputs"), outputs_block(config));

        if config.cwl_version == CwlVersion::V1_2 {
            let mut namespaces = Mapping::new();
            namespaces.insert(Value::from("s"), Value::from("https://schema.org/"));
            doc.insert(Value::from("$namespaces"), Value::Mapping(namespaces));

            let authors: Vec<Value> = meta
                .authors
                .iter()
                .map(|author| {
                    let mut person = Mapping::new();
                    person.insert(Value::from("class"), Value::from("s:Person"));
                    person.insert(Value::from("s:name"), Value::from(author.display_name()));
                    if let Some(orcid) = author.orcid.as_deref() {
                        person.insert(Value::from("s:sameAs"), Value::from(orcid));
                    }
                    Value::Mapping(person)
                })
                .collect();
            if !authors.is_empty() {
                doc.insert(Value::from("s:author"), Value::Sequence(authors));
            }
            doc.insert(
                Value::from("s:softwareVersion"),
                Value::from(meta.version.clone()),
            );
            if let Some(license) = meta.license.as_deref() {
                doc.insert(Value::from("s:license"), Value::from(license));
            }
        }

        serde_yaml::to_string(&Value::Mapping(doc)).map_err(|e| ExportError::Serialize {
            format: "CWL",
            message: e.to_string(),
        })
    }
}

// v1.1 has no namespace support; the same metadata rides along as text.
fn plain_text_metadata(meta: &UnifiedSoftwareMetadata) -> String {
    let mut text = String::from("\n\n---\n");
    if !meta.authors.is_empty() {
        let names: Vec<String> = meta.authors.iter().map(|a| a.display_name()).collect();
        text.push_str(&format!("Authors: {}\n", names.join(", ")));
    }
    text.push_str(&format!("Version: {}\n", meta.version));
    if let Some(license) = meta.license.as_deref() {
        text.push_str(&format!("License: {license}\n"));
    }
    text
}

/// The synthesized shell sequence: write `inputs.json` from runtime
/// parameter references, then run the container with the fixed `/in` and
/// `/out` mounts.
fn shell_sequence(meta: &UnifiedSoftwareMetadata, config: &CwlConfig) -> String {
    let container = config
        .container
        .as_deref()
        .unwrap_or(&meta.galaxy_defaults.container);

    let mut fields = Vec::new();
    for (name, def) in &meta.tool.parameters {
        fields.push(format!(
            "\"{name}\": {}",
            json_value_reference(name, def)
        ));
    }
    let json_body = format!("{{{}}}", fields.join(", "));

    let mut script = String::new();
    script.push_str("mkdir -p inputs outputs\n");
    script.push_str(&format!("echo '{json_body}' > inputs/inputs.json\n"));
    script.push_str(&format!(
        "docker run --rm -v \"$(pwd)/inputs:/in\" -v \"$(pwd)/outputs:/out\" -e TOOL_RUN={tool} {container}\n",
        tool = slugify(&meta.name),
    ));
    script
}

// String-family values are quoted in the constructed JSON; numeric and
// boolean values stay raw. Files substitute their runtime path.
fn json_value_reference(name: &str, def: &ParameterDef) -> String {
    match def.kind {
        ParameterType::Integer | ParameterType::Float | ParameterType::Boolean => {
            format!("$(inputs.{name})")
        }
        ParameterType::Asset => format!("\"$(inputs.{name}.path)\""),
        ParameterType::String | ParameterType::Enum => format!("\"$(inputs.{name})\""),
    }
}

fn inputs_block(meta: &UnifiedSoftwareMetadata) -> Value {
    let mut inputs = Mapping::new();

    match &meta.tool.data {
        ToolData::Entries(entries) => {
            for (name, def) in entries {
                let mut input = Mapping::new();
                input.insert(Value::from("type"), Value::from("File"));
                if let Some(description) = def.description.as_deref() {
                    input.insert(Value::from("doc"), Value::from(description));
                }
                inputs.insert(Value::from(name.clone()), Value::Mapping(input));
            }
        }
        ToolData::Names(names) => {
            for name in names {
                let mut input = Mapping::new();
                input.insert(Value::from("type"), Value::from("File"));
                inputs.insert(Value::from(name.clone()), Value::Mapping(input));
            }
        }
    }

    for (name, def) in &meta.tool.parameters {
        let mut input = Mapping::new();
        input.insert(Value::from("type"), parameter_type(def));
        if let Some(description) = def.description.as_deref() {
            input.insert(Value::from("doc"), Value::from(description));
        }
        if let Some(default) = def.default.as_ref() {
            input.insert(Value::from("default"), default.clone());
        }
        inputs.insert(Value::from(name.clone()), Value::Mapping(input));
    }

    Value::Mapping(inputs)
}

/// string→string, integer→int, float→float, boolean→boolean,
/// enum→{enum, symbols}, asset→File; `array` wraps as array-of,
/// `optional` wraps as a union with null.
fn parameter_type(def: &ParameterDef) -> Value {
    let base = match def.kind {
        ParameterType::String => Value::from("string"),
        ParameterType::Integer => Value::from("int"),
        ParameterType::Float => Value::from("float"),
        ParameterType::Boolean => Value::from("boolean"),
        ParameterType::Asset => Value::from("File"),
        ParameterType::Enum => {
            let mut enum_type = Mapping::new();
            enum_type.insert(Value::from("type"), Value::from("enum"));
            enum_type.insert(
                Value::from("symbols"),
                Value::Sequence(def.values.iter().map(|v| Value::from(v.clone())).collect()),
            );
            Value::Mapping(enum_type)
        }
    };

    let wrapped = if def.array {
        let mut array_type = Mapping::new();
        array_type.insert(Value::from("type"), Value::from("array"));
        array_type.insert(Value::from("items"), base);
        Value::Mapping(array_type)
    } else {
        base
    };

    if def.optional {
        Value::Sequence(vec![Value::from("null"), wrapped])
    } else {
        wrapped
    }
}

fn outputs_block(config: &CwlConfig) -> Value {
    let mut outputs = Mapping::new();
    for output in &config.outputs {
        let mut entry = Mapping::new();
        entry.insert(Value::from("type"), Value::from("File"));
        let glob = output.glob.as_deref().unwrap_or(&output.name);
        let mut binding = Mapping::new();
        binding.insert(Value::from("glob"), Value::from(format!("outputs/{glob}")));
        entry.insert(Value::from("outputBinding"), Value::Mapping(binding));
        outputs.insert(Value::from(output.name.clone()), Value::Mapping(entry));
    }
    Value::Mapping(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::{Author, CitationCff};
    use crate::metadata::build_unified_metadata;
    use crate::toolspec::validate_tool_yaml;

    fn meta() -> UnifiedSoftwareMetadata {
        let repo = crate::github::RepoInfo {
            owner: "owner".into(),
            name: "repo".into(),
            full_name: "owner/repo".into(),
            description: None,
            language: None,
            stars: 0,
            created_at: None,
            updated_at: None,
            clone_url: "https://github.com/owner/repo.git".into(),
            html_url: "https://github.com/owner/repo".into(),
            default_branch: "main".into(),
        };
        let spec = validate_tool_yaml(
            r#"
tools:
  mytool:
    title: MyTool
    description: Does X.
    parameters:
      threshold:
        type: float
      label:
        type: string
        optional: true
      tags:
        type: string
        array: true
      observations:
        type: asset
"#,
        )
        .tool_spec
        .unwrap();
        let citation = CitationCff {
            title: "T".into(),
            authors: vec![Author {
                given_names: Some("Jane".into()),
                family_names: Some("Doe".into()),
                ..Default::default()
            }],
            license: Some("MIT".into()),
            ..Default::default()
        };
        build_unified_metadata(Some(&repo), Some(&spec), Some(&citation), None, None, None).unwrap()
    }

    #[test]
    fn v12_embeds_namespaced_metadata() {
        let out = CwlExporter.export(&meta(), &CwlConfig::default()).unwrap();
        let doc: Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(doc["cwlVersion"], Value::from("v1.2"));
        assert_eq!(doc["$namespaces"]["s"], Value::from("https://schema.org/"));
        assert_eq!(doc["s:author"][0]["s:name"], Value::from("Jane Doe"));
        assert_eq!(doc["s:license"], Value::from("MIT"));
    }

    #[test]
    fn v11_appends_metadata_to_doc_text() {
        let config = CwlConfig {
            cwl_version: CwlVersion::V1_1,
            ..Default::default()
        };
        let out = CwlExporter.export(&meta(), &config).unwrap();
        let doc: Value = serde_yaml::from_str(&out).unwrap();
        assert!(doc.get("$namespaces").is_none());
        let text = doc["doc"].as_str().unwrap();
        assert!(text.contains("Authors: Jane Doe"));
        assert!(text.contains("License: MIT"));
    }

    #[test]
    fn type_mapping_wraps_optional_and_array() {
        let out = CwlExporter.export(&meta(), &CwlConfig::default()).unwrap();
        let doc: Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(doc["inputs"]["threshold"]["type"], Value::from("float"));
        // optional=true wraps as a null union
        assert_eq!(doc["inputs"]["label"]["type"][0], Value::from("null"));
        assert_eq!(doc["inputs"]["label"]["type"][1], Value::from("string"));
        // array=true wraps as array-of
        assert_eq!(doc["inputs"]["tags"]["type"]["type"], Value::from("array"));
        assert_eq!(doc["inputs"]["tags"]["type"]["items"], Value::from("string"));
        assert_eq!(doc["inputs"]["observations"]["type"], Value::from("File"));
    }

    #[test]
    fn inputs_have_no_command_line_binding() {
        let out = CwlExporter.export(&meta(), &CwlConfig::default()).unwrap();
        assert!(!out.contains("inputBinding"));
    }

    #[test]
    fn shell_sequence_quotes_strings_not_numbers() {
        let out = CwlExporter.export(&meta(), &CwlConfig::default()).unwrap();
        let doc: Value = serde_yaml::from_str(&out).unwrap();
        let script = doc["arguments"][1].as_str().unwrap();
        assert!(script.contains("\"threshold\": $(inputs.threshold)"), "{script}");
        assert!(script.contains("\"label\": \"$(inputs.label)\""), "{script}");
        assert!(script.contains("\"observations\": \"$(inputs.observations.path)\""));
        assert!(script.contains("TOOL_RUN=mytool"));
        assert!(script.contains(":/in"));
        assert!(script.contains(":/out"));
        assert!(script.contains("> inputs/inputs.json"));
    }

    #[test]
    fn validation_requires_some_input_or_output() {
        let repo = crate::github::RepoInfo {
            owner: "o".into(),
            name: "r".into(),
            full_name: "o/r".into(),
            description: None,
            language: None,
            stars: 0,
            created_at: None,
            updated_at: None,
            clone_url: String::new(),
            html_url: String::new(),
            default_branch: "main".into(),
        };
        let spec = validate_tool_yaml("tools:\n  t:\n    title: T\n    description: D\n")
            .tool_spec
            .unwrap();
        let meta = build_unified_metadata(Some(&repo), Some(&spec), None, None, None, None).unwrap();
        let issues = CwlExporter.validate(&meta, &CwlConfig::default());
        assert!(issues.iter().any(|i| i.contains("at least one input or output")));
    }
}
