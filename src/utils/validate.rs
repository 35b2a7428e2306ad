//! Input validation and identifier normalization.
//!
//! Queries are validated before any source is contacted. DOIs arrive from
//! sources in several spellings (`doi:10.x/y`, `https://doi.org/10.x/y`, bare)
//! and are reduced to the bare form here.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing query")]
    EmptyQuery,

    #[error("Invalid page number: {0}")]
    InvalidPage(usize),

    #[error("Invalid page size: {0}")]
    InvalidPageSize(usize),
}

/// Prefixes stripped from DOIs, matched case-insensitively
const DOI_PREFIXES: [&str; 5] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Reduce a DOI to its bare `10.xxxx/yyyy` form
///
/// Case is preserved; duplicate detection lower-cases separately.
/// Returns an empty string for blank input.
pub fn normalize_doi(raw: &str) -> String {
    let mut doi = raw.trim();

    for prefix in DOI_PREFIXES {
        if doi.len() >= prefix.len()
            && doi.is_char_boundary(prefix.len())
            && doi[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            doi = doi[prefix.len()..].trim_start();
            break;
        }
    }

    doi.trim().to_string()
}

/// Parse a page parameter, falling back to 1 for absent, non-numeric or zero values
pub fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|p| p.trim().parse::<usize>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Parse a boolean-ish flag (`true`, `1`, `yes`, `on`)
pub fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_doi_prefixes() {
        assert_eq!(normalize_doi("10.1234/abc123"), "10.1234/abc123");
        assert_eq!(normalize_doi("doi:10.1234/abc123"), "10.1234/abc123");
        assert_eq!(normalize_doi("doi: 10.1234/ABC"), "10.1234/ABC");
        assert_eq!(
            normalize_doi("https://doi.org/10.1038/nature12345"),
            "10.1038/nature12345"
        );
        assert_eq!(
            normalize_doi("HTTPS://DX.DOI.ORG/10.1038/x"),
            "10.1038/x"
        );
        assert_eq!(normalize_doi("   "), "");
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-2")), 1);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("YES")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(None));
    }
}
