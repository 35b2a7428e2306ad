//! Registry holding the ordered list of active sources.

use std::sync::Arc;

#[cfg(feature = "source-arxiv")]
use super::ArxivSource;
#[cfg(feature = "source-crossref")]
use super::CrossRefSource;
#[cfg(feature = "source-datacite")]
use super::DataCiteSource;
#[cfg(feature = "source-doaj")]
use super::DoajSource;
#[cfg(feature = "source-europe_pmc")]
use super::EuropePmcSource;
#[cfg(feature = "source-openalex")]
use super::OpenAlexSource;
#[cfg(feature = "source-pubmed")]
use super::PubMedSource;
#[cfg(feature = "source-semantic")]
use super::SemanticScholarSource;
#[cfg(feature = "source-zenodo")]
use super::ZenodoSource;
use super::{Source, SourceError};
use crate::config::Config;
use crate::utils::HttpClient;

/// Ordered registry of sources
///
/// Registration order is significant: it is the order in which results from
/// different sources are merged, and therefore which copy of a duplicated DOI
/// survives.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

/// Try to register a source, respecting the enabled/disabled configuration
macro_rules! register_if_enabled {
    ($registry:expr, $config:expr, $client:expr, $id:literal, $ty:ty) => {
        if $config.sources.is_enabled($id) {
            $registry.register(Arc::new(<$ty>::new(Arc::clone(&$client), $config)));
        } else {
            tracing::debug!("Source '{}' disabled by configuration", $id);
        }
    };
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry from a fixed list of sources, keeping their order
    pub fn with_sources(sources: Vec<Arc<dyn Source>>) -> Self {
        let mut registry = Self::empty();
        for source in sources {
            registry.register(source);
        }
        registry
    }

    /// Register every compiled-in source the configuration enables
    ///
    /// All sources share one HTTP client built from the `[http]` section.
    #[allow(unused_variables)]
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = Arc::new(HttpClient::from_config(&config.http)?);
        let mut registry = Self::empty();

        #[cfg(feature = "source-crossref")]
        register_if_enabled!(registry, config, client, "crossref", CrossRefSource);
        #[cfg(feature = "source-openalex")]
        register_if_enabled!(registry, config, client, "openalex", OpenAlexSource);
        #[cfg(feature = "source-semantic")]
        register_if_enabled!(registry, config, client, "semantic", SemanticScholarSource);
        #[cfg(feature = "source-doaj")]
        register_if_enabled!(registry, config, client, "doaj", DoajSource);
        #[cfg(feature = "source-arxiv")]
        register_if_enabled!(registry, config, client, "arxiv", ArxivSource);
        #[cfg(feature = "source-pubmed")]
        register_if_enabled!(registry, config, client, "pubmed", PubMedSource);
        #[cfg(feature = "source-europe_pmc")]
        register_if_enabled!(registry, config, client, "europe_pmc", EuropePmcSource);
        #[cfg(feature = "source-datacite")]
        register_if_enabled!(registry, config, client, "datacite", DataCiteSource);
        #[cfg(feature = "source-zenodo")]
        register_if_enabled!(registry, config, client, "zenodo", ZenodoSource);

        tracing::debug!("Registered sources: {:?}", registry.ids().collect::<Vec<_>>());
        Ok(registry)
    }

    /// Register a source
    ///
    /// A source with an id that is already registered replaces the old one in
    /// place; otherwise it is appended.
    pub fn register(&mut self, source: Arc<dyn Source>) {
        match self.sources.iter().position(|s| s.id() == source.id()) {
            Some(index) => self.sources[index] = source,
            None => self.sources.push(source),
        }
    }

    /// Keep only the given source ids, preserving registration order
    pub fn restricted_to(&self, ids: &[String]) -> Result<Self, SourceError> {
        if let Some(unknown) = ids.iter().find(|id| !self.has(id)) {
            return Err(SourceError::InvalidRequest(format!(
                "Source '{}' is not available (available: {})",
                unknown,
                self.ids().collect::<Vec<_>>().join(", ")
            )));
        }

        Ok(Self {
            sources: self
                .sources
                .iter()
                .filter(|s| ids.iter().any(|id| id.eq_ignore_ascii_case(s.id())))
                .cloned()
                .collect(),
        })
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.id().eq_ignore_ascii_case(id))
    }

    /// All registered sources in registration order
    pub fn all(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    /// Get all source IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    /// Check if a source exists
    pub fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
