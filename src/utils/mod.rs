//! Utility modules supporting the search pipeline.
//!
//! - [`dedupe`]: Drop records whose DOI was already seen (case-insensitive, first wins)
//! - [`HttpClient`]: Shared reqwest client with status and body error mapping
//! - [`normalize_doi`]: Reduce a DOI to its bare `10.xxxx/yyyy` form
//! - [`strip_markup`]: Drop HTML/JATS tags from abstracts
//! - [`ValidationError`]: Query validation failures
//!
//! # Deduplication
//!
//! ```rust
//! use research_aggregator::models::RecordBuilder;
//! use research_aggregator::utils::dedupe;
//!
//! let records = vec![
//!     RecordBuilder::new("Crossref").doi("10.1/ABC").build(),
//!     RecordBuilder::new("OpenAlex").doi("10.1/abc").build(),
//! ];
//! let unique = dedupe(records);
//! assert_eq!(unique.len(), 1);
//! assert_eq!(unique[0].source, "Crossref");
//! ```

mod dedup;
mod http;
mod text;
mod validate;

pub use dedup::dedupe;
pub use http::HttpClient;
pub use text::{collapse_whitespace, strip_markup};
pub use validate::{normalize_doi, parse_flag, parse_page, ValidationError};
