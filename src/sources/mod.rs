//! Bibliographic source adapters with a trait-based architecture.
//!
//! This module defines the [`Source`] trait that every upstream metadata
//! provider implements. Each adapter owns exactly one provider's request
//! format and field-mapping rules and turns the provider's response into
//! [`NormalizedRecord`]s. Adapters are registered, in a fixed order, with the
//! [`SourceRegistry`]; the pipeline never branches on which concrete sources
//! exist.
//!
//! # Feature Flags
//!
//! Individual sources can be disabled at compile time using Cargo features:
//!
//! - `crossref` - Crossref works API (default: enabled)
//! - `openalex` - OpenAlex works API (default: enabled)
//! - `semantic` - Semantic Scholar graph API (default: enabled)
//! - `doaj` - Directory of Open Access Journals (default: enabled)
//! - `arxiv` - arXiv Atom API (default: enabled)
//! - `pubmed` - PubMed E-utilities, two-phase search/summary (default: enabled)
//! - `europe_pmc` - Europe PMC REST API (default: enabled)
//! - `datacite` - DataCite DOI registry (default: enabled)
//! - `zenodo` - Zenodo research-data repository (default: enabled)
//!
//! # Feature Groups
//!
//! - `biomedical` - pubmed, europe_pmc
//! - `registries` - crossref, datacite
//! - `full` - All sources (default)
//!
//! # Runtime Source Configuration
//!
//! All compiled-in sources are registered unless excluded by configuration:
//!
//! - `RESEARCH_AGGREGATOR_ENABLED_SOURCES` - Only use these sources (e.g., "arxiv,crossref")
//! - `RESEARCH_AGGREGATOR_DISABLED_SOURCES` - Never use these sources (e.g., "zenodo")
//!
//! The same lists can be set in the `[sources]` section of the config file.
//! Disabled sources always take precedence.

#[cfg(feature = "source-arxiv")]
mod arxiv;
#[cfg(feature = "source-crossref")]
mod crossref;
#[cfg(feature = "source-datacite")]
mod datacite;
#[cfg(feature = "source-doaj")]
mod doaj;
#[cfg(feature = "source-europe_pmc")]
mod europe_pmc;
#[cfg(feature = "source-openalex")]
mod openalex;
#[cfg(feature = "source-pubmed")]
mod pubmed;
mod registry;
#[cfg(feature = "source-semantic")]
mod semantic;
#[cfg(feature = "source-zenodo")]
mod zenodo;

pub mod mock;

pub use mock::MockSource;

pub use registry::SourceRegistry;

#[cfg(feature = "source-arxiv")]
pub use arxiv::ArxivSource;
#[cfg(feature = "source-crossref")]
pub use crossref::CrossRefSource;
#[cfg(feature = "source-datacite")]
pub use datacite::DataCiteSource;
#[cfg(feature = "source-doaj")]
pub use doaj::DoajSource;
#[cfg(feature = "source-europe_pmc")]
pub use europe_pmc::EuropePmcSource;
#[cfg(feature = "source-openalex")]
pub use openalex::OpenAlexSource;
#[cfg(feature = "source-pubmed")]
pub use pubmed::PubMedSource;
#[cfg(feature = "source-semantic")]
pub use semantic::SemanticScholarSource;
#[cfg(feature = "source-zenodo")]
pub use zenodo::ZenodoSource;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{NormalizedRecord, Query};

/// The Source trait defines the interface for all bibliographic sources.
///
/// # Implementing a New Source
///
/// 1. Create a new struct that implements `Source`
/// 2. Build the upstream request from the [`Query`] and parse the response
///    into [`NormalizedRecord`]s with [`crate::models::RecordBuilder`]
/// 3. Register it in [`SourceRegistry::from_config`] or dynamically with
///    [`SourceRegistry::register`]
///
/// A source yields its whole batch or an error; it never returns a partial
/// batch. The dispatcher turns errors (and panics) into
/// [`crate::models::SourceOutcome::Failed`].
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "crossref", "pubmed")
    fn id(&self) -> &str;

    /// Canonical name written into each record's `source` field
    fn name(&self) -> &str;

    /// Search for records matching the query
    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Unparsable response body (XML, JSON, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Response parsed but an expected container field is missing
    #[error("Unexpected response shape: {0}")]
    Schema(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Non-success status from the source
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// Locate the array of result items at `pointer`, failing if it is absent
pub(crate) fn container<'a>(
    source: &str,
    body: &'a Value,
    pointer: &str,
) -> Result<&'a [Value], SourceError> {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| SourceError::Schema(format!("{} response is missing {}", source, pointer)))
}

/// Decode each item on its own, skipping items that do not fit the shape
pub(crate) fn decode_items<T: DeserializeOwned>(source: &str, items: &[Value]) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match T::deserialize(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!("{}: skipping item {}: {}", source, i, e);
                None
            }
        })
        .collect()
}
