//! Zenodo research source implementation.
//!
//! API documentation: <https://developers.zenodo.org>

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{container, decode_items, Source, SourceError};
use crate::utils::{strip_markup, HttpClient};

const ZENODO_API_BASE: &str = "https://zenodo.org/api";

/// Anonymous requests are limited to 25 records per page
const ZENODO_MAX_SIZE: usize = 25;

/// Zenodo research source
///
/// Zenodo is free and requires no API key.
#[derive(Debug, Clone)]
pub struct ZenodoSource {
    client: Arc<HttpClient>,
    base_url: String,
    fetch_limit: usize,
}

impl ZenodoSource {
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: ZENODO_API_BASE.to_string(),
            fetch_limit: config.search.fetch_limit,
        }
    }

    /// Point the source at a different API host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_search_url(&self, query: &Query) -> String {
        format!(
            "{}/records?q={}&size={}",
            self.base_url,
            urlencoding::encode(&query.text),
            self.fetch_limit.min(ZENODO_MAX_SIZE)
        )
    }

    fn parse_response(body: &Value, include_abstract: bool) -> Result<Vec<NormalizedRecord>, SourceError> {
        let items = container("Zenodo", body, "/hits/hits")?;

        Ok(decode_items::<ZenodoHit>("Zenodo", items)
            .into_iter()
            .map(|hit| hit.into_record(include_abstract))
            .collect())
    }
}

#[async_trait]
impl Source for ZenodoSource {
    fn id(&self) -> &str {
        "zenodo"
    }

    fn name(&self) -> &str {
        "Zenodo"
    }

    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        let url = self.build_search_url(query);
        tracing::debug!("Zenodo request: {}", url);

        let body = self.client.get_json(self.name(), self.client.get(&url)).await?;
        Self::parse_response(&body, query.include_abstract)
    }
}

// ===== Zenodo API Types =====

#[derive(Debug, Deserialize)]
struct ZenodoHit {
    #[serde(default)]
    metadata: Option<ZenodoMetadata>,
    #[serde(default)]
    links: Option<ZenodoLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct ZenodoMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    creators: Option<Vec<ZenodoCreator>>,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZenodoCreator {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ZenodoLinks {
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    html: Option<String>,
}

impl ZenodoHit {
    fn into_record(self, include_abstract: bool) -> NormalizedRecord {
        let metadata = self.metadata.unwrap_or_default();
        let links = self.links.unwrap_or_default();

        let authors = metadata
            .creators
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.name)
            .collect::<Vec<_>>();

        RecordBuilder::new("Zenodo")
            .title(metadata.title.unwrap_or_default())
            .authors(authors)
            .journal("Zenodo")
            .year(metadata.publication_date.unwrap_or_default())
            .doi(metadata.doi.unwrap_or_default())
            .fallback_link(links.doi.unwrap_or_default())
            .fallback_link(links.html.unwrap_or_default())
            .abstract_text(
                include_abstract,
                metadata.description.as_deref().map(strip_markup).as_deref(),
            )
            .build()
    }
}
