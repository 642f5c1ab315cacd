//! SPDX license normalization tables.
//!
//! Free-text license strings map onto SPDX identifiers through a fixed
//! lookup table: exact match on the normalized token first, substring
//! containment as the fallback. Ordered, first match wins.

const SPDX_URI_BASE: &str = "https://spdx.org/licenses/";

/// (normalized token, SPDX identifier). Longer/more specific tokens first so
/// the substring fallback cannot shadow them (e.g. lgpl before gpl).
const SPDX_TABLE: &[(&str, &str)] = &[
    ("apache20", "Apache-2.0"),
    ("apachelicense20", "Apache-2.0"),
    ("apache", "Apache-2.0"),
    ("agpl30", "AGPL-3.0-only"),
    ("agpl", "AGPL-3.0-only"),
    ("lgpl30", "LGPL-3.0-only"),
    ("lgpl21", "LGPL-2.1-only"),
    ("lgpl", "LGPL-3.0-only"),
    ("gplv3", "GPL-3.0-only"),
    ("gpl30", "GPL-3.0-only"),
    ("gplv2", "GPL-2.0-only"),
    ("gpl20", "GPL-2.0-only"),
    ("gpl", "GPL-3.0-only"),
    ("bsd3clause", "BSD-3-Clause"),
    ("bsd2clause", "BSD-2-Clause"),
    ("bsd", "BSD-3-Clause"),
    ("mpl20", "MPL-2.0"),
    ("mozillapubliclicense", "MPL-2.0"),
    ("mpl", "MPL-2.0"),
    ("epl20", "EPL-2.0"),
    ("eclipsepubliclicense", "EPL-2.0"),
    ("epl", "EPL-2.0"),
    ("unlicense", "Unlicense"),
    ("cc010", "CC0-1.0"),
    ("cc0", "CC0-1.0"),
    ("ccby40", "CC-BY-4.0"),
    ("isc", "ISC"),
    ("mit", "MIT"),
];

fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Map a free-text license string onto an SPDX identifier. `None` when no
/// table entry matches even by substring.
pub fn spdx_identifier(raw: &str) -> Option<&'static str> {
    let token = normalize_token(raw);
    if token.is_empty() {
        return None;
    }
    // Exact match first, substring containment second.
    SPDX_TABLE
        .iter()
        .find(|(key, _)| *key == token)
        .or_else(|| SPDX_TABLE.iter().find(|(key, _)| token.contains(key)))
        .map(|(_, id)| *id)
}

/// Map a license string onto an SPDX URI for RDF output. Unmapped strings
/// pass the normalized token through unchanged, assuming it already is a
/// valid SPDX suffix.
pub fn spdx_uri(raw: &str) -> String {
    if let Some(id) = spdx_identifier(raw) {
        return format!("{SPDX_URI_BASE}{id}");
    }
    let token = raw
        .trim()
        .replace(['(', ')'], "")
        .replace(' ', "-")
        .to_uppercase();
    format!("{SPDX_URI_BASE}{token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_resolve() {
        assert_eq!(spdx_identifier("MIT"), Some("MIT"));
        assert_eq!(spdx_identifier("Apache-2.0"), Some("Apache-2.0"));
        assert_eq!(spdx_identifier("GPL-3.0"), Some("GPL-3.0-only"));
        assert_eq!(spdx_identifier("CC0-1.0"), Some("CC0-1.0"));
    }

    #[test]
    fn substring_fallback_resolves_free_text() {
        assert_eq!(spdx_identifier("The MIT License"), Some("MIT"));
        assert_eq!(spdx_identifier("Apache License 2.0"), Some("Apache-2.0"));
        assert_eq!(
            spdx_identifier("GNU Lesser General Public License lgpl-3.0"),
            Some("LGPL-3.0-only")
        );
    }

    #[test]
    fn lgpl_is_not_shadowed_by_gpl() {
        assert_eq!(spdx_identifier("LGPL"), Some("LGPL-3.0-only"));
    }

    #[test]
    fn unknown_strings_yield_none() {
        assert_eq!(spdx_identifier("proprietary-internal"), None);
        assert_eq!(spdx_identifier(""), None);
    }

    #[test]
    fn uri_passes_unmapped_tokens_through_normalized() {
        assert_eq!(
            spdx_uri("EUPL 1.2 (european union)"),
            "https://spdx.org/licenses/EUPL-1.2-EUROPEAN-UNION"
        );
        assert_eq!(spdx_uri("MIT"), "https://spdx.org/licenses/MIT");
    }
}
