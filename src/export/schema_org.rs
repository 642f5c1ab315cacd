//! Schema.org SoftwareApplication JSON-LD export.

use serde_json::{Map, Value, json};

use crate::error::ExportError;
use crate::export::{Exporter, ExportFormat, baseline_issues, licenses};
use crate::metadata::UnifiedSoftwareMetadata;

pub struct SchemaOrgExporter;

impl Exporter for SchemaOrgExporter {
    type Config = ();

    fn format(&self) -> ExportFormat {
        ExportFormat::Schemaorg
    }

    fn validate(&self, meta: &UnifiedSoftwareMetadata, _config: &()) -> Vec<String> {
        let mut issues = baseline_issues(meta);
        if meta.repository.html_url.trim().is_empty() && meta.repository.clone_url.trim().is_empty()
        {
            issues.push("Schema.org export requires a url or codeRepository".to_string());
        }
        if meta.version.trim().is_empty() {
            issues.push("Schema.org export requires a non-empty version".to_string());
        }
        issues
    }

    fn export(&self, meta: &UnifiedSoftwareMetadata, _config: &()) -> Result<String, ExportError> {
        let mut doc = Map::new();
        doc.insert("@context".into(), json!("https://schema.org"));
        doc.insert("@type".into(), json!("SoftwareApplication"));
        doc.insert("name".into(), json!(meta.name));
        doc.insert("description".into(), json!(meta.description));
        doc.insert("softwareVersion".into(), json!(meta.version));
        doc.insert("url".into(), json!(meta.repository.html_url));
        doc.insert("codeRepository".into(), json!(meta.repository.clone_url));

        if let Some(language) = meta.repository.language.as_deref() {
            doc.insert("programmingLanguage".into(), json!(language));
        }

        let authors: Vec<Value> = meta.authors.iter().map(author_to_person).collect();
        if !authors.is_empty() {
            doc.insert("author".into(), Value::Array(authors));
        }

        if !meta.keywords.is_empty() {
            doc.insert("keywords".into(), json!(meta.keywords.join(", ")));
        }

        if let Some(license) = meta.license.as_deref() {
            doc.insert("license".into(), json!(normalize_license(license)));
        }

        if let Some(created) = meta.repository.created_at.as_deref() {
            doc.insert("dateCreated".into(), json!(created));
        }
        if let Some(updated) = meta.repository.updated_at.as_deref() {
            doc.insert("dateModified".into(), json!(updated));
        }

        serde_json::to_string_pretty(&Value::Object(doc)).map_err(|e| ExportError::Serialize {
            format: "Schema.org",
            message: e.to_string(),
        })
    }
}

// SPDX identifier when the lookup table recognizes the string, expressed as
// the canonical SPDX URL; unmapped strings stay verbatim.
fn normalize_license(raw: &str) -> String {
    licenses::spdx_identifier(raw)
        .map(|id| format!("https://spdx.org/licenses/{id}"))
        .unwrap_or_else(|| raw.to_string())
}

// Structured given/family names are preferred over the literal name when
// both naming conventions are present.
fn author_to_person(author: &crate::citation::Author) -> Value {
    let mut person = Map::new();
    person.insert("@type".into(), json!("Person"));
    let structured = author.given_names.is_some() || author.family_names.is_some();
    if structured {
        if let Some(given) = author.given_names.as_deref() {
            person.insert("givenName".into(), json!(given));
        }
        if let Some(family) = author.family_names.as_deref() {
            person.insert("familyName".into(), json!(family));
        }
    } else if let Some(name) = author.name.as_deref() {
        person.insert("name".into(), json!(name));
    }
    if let Some(orcid) = author.orcid.as_deref() {
        person.insert("sameAs".into(), json!(orcid));
    }
    Value::Object(person)
}
