//! CITATION.cff parsing and license comparison.
//!
//! Parsing is a deterministic two-stage affair: the primary stage
//! deserializes into typed serde structs; when that reports a parse failure
//! the fallback stage walks the raw YAML document applying the same
//! field-mapping rules against the CFF spec's raw key names. Both stages
//! normalize the two author key conventions (structured vs literal) into one
//! [`Author`] shape and feed one shared validation step.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// One author entry, normalized from either naming convention.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Author {
    pub family_names: Option<String>,
    pub given_names: Option<String>,
    pub name: Option<String>,
    pub orcid: Option<String>,
    pub email: Option<String>,
    pub affiliation: Option<String>,
}

impl Author {
    /// Whether the entry satisfies the CFF author contract: a literal name
    /// or at least one structured name part.
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self
                .given_names
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
            || self
                .family_names
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
    }

    /// Human-readable name: structured parts joined, else the literal name.
    pub fn display_name(&self) -> String {
        let structured = [self.given_names.as_deref(), self.family_names.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !structured.is_empty() {
            structured
        } else {
            self.name.clone().unwrap_or_default()
        }
    }
}

/// Citation metadata extracted from CITATION.cff.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CitationCff {
    pub title: String,
    pub authors: Vec<Author>,
    pub version: Option<String>,
    pub date_released: Option<String>,
    pub url: Option<String>,
    pub repository: Option<String>,
    pub license: Option<String>,
    pub keywords: Vec<String>,
    pub abstract_text: Option<String>,
}

/// Result record of [`parse_citation`]. Never an `Err`.
#[derive(Debug)]
pub struct CitationValidation {
    pub is_valid: bool,
    pub citation: Option<CitationCff>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

// Intermediate shape shared by both parser stages, prior to validation.
#[derive(Debug, Default, Deserialize)]
struct RawCitation {
    title: Option<String>,
    #[serde(alias = "author")]
    authors: Option<Vec<RawAuthor>>,
    version: Option<Value>,
    #[serde(rename = "date-released", alias = "date_released")]
    date_released: Option<Value>,
    url: Option<String>,
    #[serde(rename = "repository-code", alias = "repository_code", alias = "repository")]
    repository: Option<String>,
    license: Option<Value>,
    keywords: Option<Vec<String>>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAuthor {
    #[serde(rename = "family-names", alias = "family_names")]
    family_names: Option<String>,
    #[serde(rename = "given-names", alias = "given_names")]
    given_names: Option<String>,
    name: Option<String>,
    orcid: Option<String>,
    email: Option<String>,
    affiliation: Option<String>,
}

/// Parse and validate CITATION.cff text.
pub fn parse_citation(cff: &str) -> CitationValidation {
    let raw = match serde_yaml::from_str::<RawCitation>(cff) {
        Ok(raw) => raw,
        // Primary parser rejected the structure; re-read it permissively.
        Err(_) => match manual_parse(cff) {
            Ok(raw) => raw,
            Err(message) => {
                return CitationValidation {
                    is_valid: false,
                    citation: None,
                    errors: vec![message],
                    warnings: Vec::new(),
                };
            }
        },
    };

    validate_raw(raw)
}

fn manual_parse(cff: &str) -> Result<RawCitation, String> {
    let root: Value = serde_yaml::from_str(cff)
        .map_err(|e| format!("Failed to parse CITATION.cff as YAML: {e}"))?;
    let Some(map) = root.as_mapping() else {
        return Err("CITATION.cff root must be a mapping".to_string());
    };

    let get = |keys: &[&str]| -> Option<Value> {
        keys.iter()
            .find_map(|k| map.get(*k))
            .cloned()
    };

    let authors = get(&["authors", "author"]).and_then(|v| match v {
        Value::Sequence(seq) => Some(
            seq.into_iter()
                .map(|entry| match entry {
                    Value::Mapping(author) => {
                        let field = |keys: &[&str]| -> Option<String> {
                            keys.iter()
                                .find_map(|k| author.get(*k))
                                .and_then(Value::as_str)
                                .map(str::to_string)
                        };
                        RawAuthor {
                            family_names: field(&["family-names", "family_names"]),
                            given_names: field(&["given-names", "given_names"]),
                            name: field(&["name"]),
                            orcid: field(&["orcid"]),
                            email: field(&["email"]),
                            affiliation: field(&["affiliation"]),
                        }
                    }
                    // Not a mapping; carries no recognizable name parts and
                    // gets flagged by the shared validation step.
                    _ => RawAuthor::default(),
                })
                .collect(),
        ),
        _ => None,
    });

    Ok(RawCitation {
        title: get(&["title"]).and_then(|v| v.as_str().map(str::to_string)),
        authors,
        version: get(&["version"]),
        date_released: get(&["date-released", "date_released"]),
        url: get(&["url"]).and_then(|v| v.as_str().map(str::to_string)),
        repository: get(&["repository-code", "repository_code", "repository"])
            .and_then(|v| v.as_str().map(str::to_string)),
        license: get(&["license"]),
        keywords: get(&["keywords"]).and_then(|v| match v {
            Value::Sequence(seq) => Some(
                seq.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }),
        abstract_text: get(&["abstract"]).and_then(|v| v.as_str().map(str::to_string)),
    })
}

fn validate_raw(raw: RawCitation) -> CitationValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let title = match raw.title {
        Some(title) if !title.trim().is_empty() => title,
        _ => {
            errors.push("CITATION.cff is missing the required 'title' field".to_string());
            String::new()
        }
    };

    let mut authors = Vec::new();
    match raw.authors {
        Some(raw_authors) if !raw_authors.is_empty() => {
            for (index, raw_author) in raw_authors.into_iter().enumerate() {
                let author = Author {
                    family_names: raw_author.family_names,
                    given_names: raw_author.given_names,
                    name: raw_author.name,
                    orcid: raw_author.orcid,
                    email: raw_author.email,
                    affiliation: raw_author.affiliation,
                };
                if !author.has_name() {
                    // Per-author problem; the remaining entries still count.
                    errors.push(format!(
                        "author {} must have either 'name' or 'given-names'/'family-names'",
                        index + 1
                    ));
                    continue;
                }
                authors.push(author);
            }
        }
        _ => {
            errors.push("CITATION.cff must declare a non-empty 'authors' list".to_string());
        }
    }

    let date_released = raw.date_released.as_ref().map(scalar_to_string);
    if date_released.is_none() {
        warnings.push("CITATION.cff does not declare 'date-released'".to_string());
    }

    let license = raw.license.as_ref().and_then(license_to_string);
    if license.is_none() {
        warnings.push("CITATION.cff does not declare a 'license'".to_string());
    }

    if raw.url.is_none() && raw.repository.is_none() {
        warnings.push("CITATION.cff declares neither 'url' nor 'repository-code'".to_string());
    }

    let citation = CitationCff {
        title,
        authors,
        version: raw.version.as_ref().map(scalar_to_string),
        date_released,
        url: raw.url,
        repository: raw.repository,
        license,
        keywords: raw.keywords.unwrap_or_default(),
        abstract_text: raw.abstract_text,
    };

    if errors.is_empty() {
        CitationValidation {
            is_valid: true,
            citation: Some(citation),
            errors,
            warnings,
        }
    } else {
        CitationValidation {
            is_valid: false,
            citation: None,
            errors,
            warnings,
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

// CFF allows a single SPDX string or a list; the first entry wins.
fn license_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Sequence(seq) => seq.iter().find_map(|v| v.as_str().map(str::to_string)),
        _ => None,
    }
}

// =============================================================================
// License comparison
// =============================================================================

/// License families recognized by the best-effort comparison. Ordered:
/// first match wins on both sides.
const LICENSE_FAMILIES: &[&str] = &[
    "mit", "apache", "gpl", "bsd", "mozilla", "eclipse", "unlicense", "cc0",
];

/// Outcome of comparing the CFF license against the LICENSE file text.
#[derive(Debug)]
pub struct LicenseComparison {
    pub compatible: bool,
    pub warnings: Vec<String>,
}

/// Compare the citation's declared license with the LICENSE file content.
///
/// Absence on either side is treated as compatible with an explanatory
/// warning; undetectable content yields a warning, never a mismatch.
pub fn compare_licenses(
    cff_license: Option<&str>,
    license_text: Option<&str>,
) -> LicenseComparison {
    match (cff_license, license_text) {
        (None, None) => LicenseComparison {
            compatible: true,
            warnings: vec![
                "No license information available in CITATION.cff or a LICENSE file".to_string(),
            ],
        },
        (Some(_), None) => LicenseComparison {
            compatible: true,
            warnings: vec![
                "CITATION.cff declares a license but no LICENSE file was found".to_string(),
            ],
        },
        (None, Some(_)) => LicenseComparison {
            compatible: true,
            warnings: vec![
                "A LICENSE file exists but CITATION.cff does not declare a license".to_string(),
            ],
        },
        (Some(declared), Some(text)) => {
            let declared_norm = normalize_license(declared);
            let text_norm = normalize_license(text);

            let declared_family = LICENSE_FAMILIES
                .iter()
                .find(|f| declared_norm.contains(**f));
            let text_family = LICENSE_FAMILIES.iter().find(|f| text_norm.contains(**f));

            match (declared_family, text_family) {
                (Some(a), Some(b)) if a == b => LicenseComparison {
                    compatible: true,
                    warnings: Vec::new(),
                },
                (Some(a), Some(b)) => LicenseComparison {
                    compatible: false,
                    warnings: vec![format!(
                        "CITATION.cff license looks like '{a}' but the LICENSE file looks like '{b}'"
                    )],
                },
                // Detection failed on at least one side; never assert a
                // mismatch from inability to detect.
                _ => LicenseComparison {
                    compatible: true,
                    warnings: vec![
                        "Could not determine the license family for comparison".to_string(),
                    ],
                },
            }
        }
    }
}

pub(crate) fn normalize_license(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
