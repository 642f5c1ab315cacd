//! DOAP RDF export.
//!
//! The graph is built as an explicit list of (subject, predicate, object,
//! is_uri) triples and grouped by subject at serialization time, with
//! Turtle and RDF/XML writers selectable by configuration.
//!
//! Maintainer resolution walks a fixed fallback chain: explicit config
//! override, then the first path segment of the repository's `owner/name`
//! identifier, then the first citation author. Person identifiers prefer an
//! ORCID URI, then a mailto URI, then a synthesized placeholder from the
//! URL-encoded name - ordered by identifier stability.

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::citation::Author;
use crate::error::ExportError;
use crate::export::{Exporter, ExportFormat, baseline_issues, licenses};
use crate::metadata::UnifiedSoftwareMetadata;

const DOAP_NS: &str = "http://usefulinc.com/ns/doap#";
const FOAF_NS: &str = "http://xmlns.com/foaf/0.1/";
const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RdfFormat {
    #[default]
    Turtle,
    Rdfxml,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DoapConfig {
    /// Explicit maintainer name, overriding the fallback chain.
    pub maintainer: Option<String>,
    pub format: RdfFormat,
}

/// One edge of the graph. `is_uri` selects resource vs literal object.
#[derive(Debug, Clone)]
struct Triple {
    subject: String,
    predicate: &'static str,
    object: String,
    is_uri: bool,
}

pub struct DoapExporter;

impl Exporter for DoapExporter {
    type Config = DoapConfig;

    fn format(&self) -> ExportFormat {
        ExportFormat::Doap
    }

    fn validate(&self, meta: &UnifiedSoftwareMetadata, config: &DoapConfig) -> Vec<String> {
        let mut issues = baseline_issues(meta);
        if resolve_maintainer(meta, config).is_none() {
            issues.push("DOAP export requires a maintainer".to_string());
        }
        issues
    }

    fn export(
        &self,
        meta: &UnifiedSoftwareMetadata,
        config: &DoapConfig,
    ) -> Result<String, ExportError> {
        let triples = build_triples(meta, config);
        let output = match config.format {
            RdfFormat::Turtle => serialize_turtle(&triples),
            RdfFormat::Rdfxml => serialize_rdfxml(&triples),
        };
        Ok(output)
    }
}

// =============================================================================
// Graph construction
// =============================================================================

struct Maintainer {
    name: String,
    orcid: Option<String>,
    email: Option<String>,
}

fn resolve_maintainer(meta: &UnifiedSoftwareMetadata, config: &DoapConfig) -> Option<Maintainer> {
    if let Some(name) = config.maintainer.as_deref() {
        if !name.trim().is_empty() {
            return Some(Maintainer {
                name: name.trim().to_string(),
                orcid: None,
                email: None,
            });
        }
    }

    // Deliberate simplification carried over from the product: the owner
    // path segment stands in for the project maintainer.
    if let Some(owner) = meta.repository.full_name.split('/').next()
        && !owner.is_empty()
    {
        return Some(Maintainer {
            name: owner.to_string(),
            orcid: None,
            email: None,
        });
    }

    meta.authors.first().map(|author: &Author| Maintainer {
        name: author.display_name(),
        orcid: author.orcid.clone(),
        email: author.email.clone(),
    })
}

fn person_uri(maintainer: &Maintainer, project_uri: &str) -> String {
    if let Some(orcid) = maintainer.orcid.as_deref() {
        orcid.to_string()
    } else if let Some(email) = maintainer.email.as_deref() {
        format!("mailto:{email}")
    } else {
        format!(
            "{project_uri}#{}",
            urlencoding::encode(&maintainer.name)
        )
    }
}

fn build_triples(meta: &UnifiedSoftwareMetadata, config: &DoapConfig) -> Vec<Triple> {
    let project = if meta.repository.html_url.is_empty() {
        format!("https://github.com/{}", meta.repository.full_name)
    } else {
        meta.repository.html_url.clone()
    };

    let mut triples = Vec::new();
    let mut push = |subject: &str, predicate: &'static str, object: String, is_uri: bool| {
        triples.push(Triple {
            subject: subject.to_string(),
            predicate,
            object,
            is_uri,
        });
    };

    push(&project, "rdf:type", "doap:Project".to_string(), true);
    push(&project, "doap:name", meta.name.clone(), false);
    push(&project, "doap:shortdesc", meta.description.clone(), false);
    push(&project, "doap:homepage", project.clone(), true);
    if let Some(created) = meta.repository.created_at.as_deref() {
        push(&project, "doap:created", created.to_string(), false);
    }
    if let Some(language) = meta.repository.language.as_deref() {
        push(
            &project,
            "doap:programming-language",
            language.to_string(),
            false,
        );
    }
    if let Some(license) = meta.license.as_deref() {
        push(&project, "doap:license", licenses::spdx_uri(license), true);
    }

    let repo_node = format!("{project}#repository");
    push(&project, "doap:repository", repo_node.clone(), true);
    push(&repo_node, "rdf:type", "doap:GitRepository".to_string(), true);
    push(
        &repo_node,
        "doap:location",
        meta.repository.clone_url.clone(),
        true,
    );
    push(&repo_node, "doap:browse", project.clone(), true);

    if !meta.version.trim().is_empty() {
        let release_node = format!("{project}#release");
        push(&project, "doap:release", release_node.clone(), true);
        push(&release_node, "rdf:type", "doap:Version".to_string(), true);
        push(&release_node, "doap:revision", meta.version.clone(), false);
    }

    if let Some(maintainer) = resolve_maintainer(meta, config) {
        let person = person_uri(&maintainer, &project);
        push(&project, "doap:maintainer", person.clone(), true);
        push(&person, "rdf:type", "foaf:Person".to_string(), true);
        push(&person, "foaf:name", maintainer.name.clone(), false);
        if let Some(email) = maintainer.email.as_deref() {
            push(&person, "foaf:mbox", format!("mailto:{email}"), true);
        }
    }

    triples
}

// =============================================================================
// Serialization
// =============================================================================

fn group_by_subject(triples: &[Triple]) -> IndexMap<&str, Vec<&Triple>> {
    let mut groups: IndexMap<&str, Vec<&Triple>> = IndexMap::new();
    for triple in triples {
        groups.entry(triple.subject.as_str()).or_default().push(triple);
    }
    groups
}

fn serialize_turtle(triples: &[Triple]) -> String {
    let mut out = String::new();
    out.push_str(&format!("@prefix rdf: <{RDF_NS}> .\n"));
    out.push_str(&format!("@prefix doap: <{DOAP_NS}> .\n"));
    out.push_str(&format!("@prefix foaf: <{FOAF_NS}> .\n\n"));

    for (subject, group) in group_by_subject(triples) {
        out.push_str(&format!("<{subject}>\n"));
        for (index, triple) in group.iter().enumerate() {
            let object = if triple.is_uri {
                turtle_object(&triple.object)
            } else {
                format!("\"{}\"", escape_literal(&triple.object))
            };
            let terminator = if index + 1 == group.len() { " ." } else { " ;" };
            out.push_str(&format!("    {} {object}{terminator}\n", triple.predicate));
        }
        out.push('\n');
    }
    out
}

// Prefixed names stay bare; full URIs get angle brackets.
fn turtle_object(object: &str) -> String {
    if object.starts_with("doap:") || object.starts_with("foaf:") || object.starts_with("rdf:") {
        object.to_string()
    } else {
        format!("<{object}>")
    }
}

fn serialize_rdfxml(triples: &[Triple]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<rdf:RDF xmlns:rdf=\"{RDF_NS}\" xmlns:doap=\"{DOAP_NS}\" xmlns:foaf=\"{FOAF_NS}\">\n"
    ));

    for (subject, group) in group_by_subject(triples) {
        out.push_str(&format!(
            "  <rdf:Description rdf:about=\"{}\">\n",
            escape_attribute(subject)
        ));
        for triple in group {
            if triple.is_uri {
                let resource = expand_prefixed(&triple.object);
                out.push_str(&format!(
                    "    <{} rdf:resource=\"{}\"/>\n",
                    triple.predicate,
                    escape_attribute(&resource)
                ));
            } else {
                out.push_str(&format!(
                    "    <{0}>{1}</{0}>\n",
                    triple.predicate,
                    escape_text(&triple.object)
                ));
            }
        }
        out.push_str("  </rdf:Description>\n");
    }
    out.push_str("</rdf:RDF>\n");
    out
}

fn expand_prefixed(object: &str) -> String {
    if let Some(local) = object.strip_prefix("doap:") {
        format!("{DOAP_NS}{local}")
    } else if let Some(local) = object.strip_prefix("foaf:") {
        format!("{FOAF_NS}{local}")
    } else if let Some(local) = object.strip_prefix("rdf:") {
        format!("{RDF_NS}{local}")
    } else {
        object.to_string()
    }
}

fn escape_literal(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}
