//! Core data models for normalized records and search operations.

mod record;
mod search;

pub use record::{
    join_authors, year_from_value, year_prefix, NormalizedRecord, RecordBuilder, AUTHOR_SEPARATOR,
    DOI_RESOLVER, MAX_AUTHORS,
};
pub use search::{Query, SearchPage, SourceOutcome, DEFAULT_PAGE_SIZE};
