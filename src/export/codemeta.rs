//! CodeMeta 2.0 JSON-LD export.
//!
//! Direct field projection into the CodeMeta context, plus two synthesized
//! blocks: a parameter summary aggregate (counts by type, required vs
//! optional) and a software-requirements list built from described
//! asset-typed parameters.

use serde_json::{Map, Value, json};

use crate::error::ExportError;
use crate::export::{Exporter, ExportFormat, baseline_issues, licenses};
use crate::metadata::UnifiedSoftwareMetadata;
use crate::toolspec::ParameterType;

const CODEMETA_CONTEXT: &str = "https://doi.org/10.5063/schema/codemeta-2.0";

pub struct CodeMetaExporter;

impl Exporter for CodeMetaExporter {
    type Config = ();

    fn format(&self) -> ExportFormat {
        ExportFormat::Codemeta
    }

    fn validate(&self, meta: &UnifiedSoftwareMetadata, _config: &()) -> Vec<String> {
        baseline_issues(meta)
    }

    fn export(&self, meta: &UnifiedSoftwareMetadata, _config: &()) -> Result<String, ExportError> {
        let mut doc = Map::new();
        doc.insert("@context".into(), json!(CODEMETA_CONTEXT));
        doc.insert("@type".into(), json!("SoftwareSourceCode"));
        doc.insert("name".into(), json!(meta.name));
        doc.insert("description".into(), json!(meta.description));
        doc.insert("version".into(), json!(meta.version));
        doc.insert("codeRepository".into(), json!(meta.repository.html_url));

        if let Some(language) = meta.repository.language.as_deref() {
            doc.insert(
                "programmingLanguage".into(),
                json!({ "@type": "ComputerLanguage", "name": language }),
            );
        }

        let authors: Vec<Value> = meta.authors.iter().map(author_to_person).collect();
        if !authors.is_empty() {
            doc.insert("author".into(), Value::Array(authors));
        }

        if !meta.keywords.is_empty() {
            doc.insert("keywords".into(), json!(meta.keywords));
        }

        if let Some(license) = meta.license.as_deref() {
            let value = licenses::spdx_identifier(license)
                .map(|id| format!("https://spdx.org/licenses/{id}"))
                .unwrap_or_else(|| license.to_string());
            doc.insert("license".into(), json!(value));
        }

        if let Some(created) = meta.repository.created_at.as_deref() {
            doc.insert("dateCreated".into(), json!(created));
        }
        if let Some(updated) = meta.repository.updated_at.as_deref() {
            doc.insert("dateModified".into(), json!(updated));
        }

        let requirements = software_requirements(meta);
        if !requirements.is_empty() {
            doc.insert("softwareRequirements".into(), Value::Array(requirements));
        }

        doc.insert("toolParameterSummary".into(), parameter_summary(meta));

        serde_json::to_string_pretty(&Value::Object(doc)).map_err(|e| ExportError::Serialize {
            format: "CodeMeta",
            message: e.to_string(),
        })
    }
}

fn author_to_person(author: &crate::citation::Author) -> Value {
    let mut person = Map::new();
    person.insert("@type".into(), json!("Person"));
    match (author.given_names.as_deref(), author.family_names.as_deref()) {
        (None, None) => {
            person.insert("name".into(), json!(author.name.clone().unwrap_or_default()));
        }
        (given, family) => {
            if let Some(given) = given {
                person.insert("givenName".into(), json!(given));
            }
            if let Some(family) = family {
                person.insert("familyName".into(), json!(family));
            }
        }
    }
    if let Some(orcid) = author.orcid.as_deref() {
        person.insert("@id".into(), json!(orcid));
    }
    if let Some(email) = author.email.as_deref() {
        person.insert("email".into(), json!(email));
    }
    Value::Object(person)
}

// Counts by type plus required/optional split across all parameters.
fn parameter_summary(meta: &UnifiedSoftwareMetadata) -> Value {
    let mut by_type: Map<String, Value> = Map::new();
    let mut optional = 0usize;
    for def in meta.tool.parameters.values() {
        let key = def.kind.as_str();
        let count = by_type.get(key).and_then(Value::as_u64).unwrap_or(0) + 1;
        by_type.insert(key.to_string(), json!(count));
        if def.optional {
            optional += 1;
        }
    }
    let total = meta.tool.parameters.len();
    json!({
        "total": total,
        "required": total - optional,
        "optional": optional,
        "byType": by_type,
    })
}

// Described asset parameters double as a requirements list: the tool cannot
// run without those inputs being supplied.
fn software_requirements(meta: &UnifiedSoftwareMetadata) -> Vec<Value> {
    meta.tool
        .parameters
        .iter()
        .filter(|(_, def)| def.kind == ParameterType::Asset)
        .filter_map(|(name, def)| {
            def.description
                .as_deref()
                .map(|description| json!(format!("{name}: {description}")))
        })
        .collect()
}
