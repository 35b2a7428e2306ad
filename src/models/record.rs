//! Normalized record model shared by every source.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::{collapse_whitespace, normalize_doi};

/// Maximum number of authors kept on a record
pub const MAX_AUTHORS: usize = 5;

/// Separator used when joining author display names
pub const AUTHOR_SEPARATOR: &str = ", ";

/// Canonical resolver prefix for DOI links
pub const DOI_RESOLVER: &str = "https://doi.org/";

/// A bibliographic record in the common output shape
///
/// Every field except `source` may be empty. `abstract` is only present when
/// the query asked for abstracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Canonical name of the source that produced this record
    pub source: String,

    /// Work title
    pub title: String,

    /// Author display names, comma-separated, at most [`MAX_AUTHORS`]
    pub authors: String,

    /// Venue, container, or publisher name
    pub journal: String,

    /// Four-character year prefix, or empty
    pub year: String,

    /// Bare DOI (no resolver or `doi:` prefix), or empty
    pub doi: String,

    /// Resolvable URL, DOI-based when a DOI exists
    pub link: String,

    /// Abstract text, only set when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#abstract: Option<String>,
}

impl NormalizedRecord {
    /// Create an otherwise empty record for a source
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title: String::new(),
            authors: String::new(),
            journal: String::new(),
            year: String::new(),
            doi: String::new(),
            link: String::new(),
            r#abstract: None,
        }
    }

    /// Lower-cased DOI used to detect duplicates, `None` when the record has no DOI
    pub fn dedup_key(&self) -> Option<String> {
        let doi = self.doi.trim();
        if doi.is_empty() {
            None
        } else {
            Some(doi.to_lowercase())
        }
    }

    /// Whether the title equals `needle` after trimming and case folding
    ///
    /// `needle` must already be trimmed and lower-cased.
    pub fn title_matches(&self, needle: &str) -> bool {
        self.title.trim().to_lowercase() == needle
    }
}

/// Builder applying the shared field-mapping rules
///
/// Sources feed raw values in; the builder trims, truncates authors, reduces
/// years to a four-character prefix, strips DOI prefixes and chooses the link.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: NormalizedRecord,
    fallback_link: Option<String>,
}

impl RecordBuilder {
    /// Create a new builder for the given source name
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            record: NormalizedRecord::new(source),
            fallback_link: None,
        }
    }

    /// Set title; internal whitespace is collapsed
    pub fn title(mut self, title: impl AsRef<str>) -> Self {
        self.record.title = collapse_whitespace(title.as_ref());
        self
    }

    /// Set authors from display names, keeping source order
    pub fn authors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.record.authors = join_authors(names);
        self
    }

    /// Set journal / venue
    pub fn journal(mut self, journal: impl AsRef<str>) -> Self {
        self.record.journal = collapse_whitespace(journal.as_ref());
        self
    }

    /// Set year from a string, keeping its first four characters
    pub fn year(mut self, year: impl AsRef<str>) -> Self {
        self.record.year = year_prefix(year.as_ref());
        self
    }

    /// Set year from a JSON value (integer, string, or date-parts array)
    pub fn year_value(mut self, value: Option<&Value>) -> Self {
        self.record.year = value.map(year_from_value).unwrap_or_default();
        self
    }

    /// Set DOI; resolver and `doi:` prefixes are stripped
    pub fn doi(mut self, doi: impl AsRef<str>) -> Self {
        self.record.doi = normalize_doi(doi.as_ref());
        self
    }

    /// Link used when the record has no DOI; the first non-empty call wins
    pub fn fallback_link(mut self, url: impl AsRef<str>) -> Self {
        let url = url.as_ref().trim();
        if self.fallback_link.is_none() && !url.is_empty() {
            self.fallback_link = Some(url.to_string());
        }
        self
    }

    /// Attach an abstract when `include` is set (empty when the source had none)
    pub fn abstract_text(mut self, include: bool, text: Option<&str>) -> Self {
        if include {
            self.record.r#abstract = Some(text.map(collapse_whitespace).unwrap_or_default());
        }
        self
    }

    /// Build the record, resolving the link
    pub fn build(mut self) -> NormalizedRecord {
        self.record.link = if self.record.doi.is_empty() {
            self.fallback_link.unwrap_or_default()
        } else {
            format!("{}{}", DOI_RESOLVER, self.record.doi)
        };
        self.record
    }
}

/// Join author names, skipping blanks and keeping at most [`MAX_AUTHORS`]
pub fn join_authors<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| collapse_whitespace(n.as_ref()))
        .filter(|n| !n.is_empty())
        .take(MAX_AUTHORS)
        .collect::<Vec<_>>()
        .join(AUTHOR_SEPARATOR)
}

/// First four characters of a trimmed year-bearing string
pub fn year_prefix(raw: &str) -> String {
    raw.trim().chars().take(4).collect()
}

/// Reduce a JSON year component to its four-character prefix
///
/// Accepts `2021`, `"2021-05-01"` or nested date-parts such as `[[2021, 5, 1]]`.
pub fn year_from_value(value: &Value) -> String {
    match value {
        Value::Number(n) => year_prefix(&n.to_string()),
        Value::String(s) => year_prefix(s),
        Value::Array(items) => items.first().map(year_from_value).unwrap_or_default(),
        Value::Object(map) => map
            .get("date-parts")
            .map(year_from_value)
            .unwrap_or_default(),
        _ => String::new(),
    }
}
