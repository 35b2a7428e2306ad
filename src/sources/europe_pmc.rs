//! Europe PMC research source implementation using their REST API.
//!
//! Europe PMC indexes PubMed, PMC, and preprints from bioRxiv/medRxiv.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{container, decode_items, Source, SourceError};
use crate::utils::{strip_markup, HttpClient};

/// Europe PMC REST API base URL
const EUROPE_PMC_API_BASE: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest";

const EUROPE_PMC_MAX_PAGE_SIZE: usize = 1000;

/// Europe PMC research source
#[derive(Debug, Clone)]
pub struct EuropePmcSource {
    client: Arc<HttpClient>,
    base_url: String,
    fetch_limit: usize,
}

impl EuropePmcSource {
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: EUROPE_PMC_API_BASE.to_string(),
            fetch_limit: config.search.fetch_limit,
        }
    }

    /// Point the source at a different API host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_search_url(&self, query: &Query) -> String {
        let url = format!(
            "{}/search?query={}&format=json&pageSize={}",
            self.base_url,
            urlencoding::encode(&query.text),
            self.fetch_limit.min(EUROPE_PMC_MAX_PAGE_SIZE)
        );

        // The lite result type has no abstracts
        if query.include_abstract {
            format!("{}&resultType=core", url)
        } else {
            url
        }
    }

    fn parse_response(body: &Value, include_abstract: bool) -> Result<Vec<NormalizedRecord>, SourceError> {
        let items = container("Europe PMC", body, "/resultList/result")?;

        Ok(decode_items::<EuropePmcResult>("Europe PMC", items)
            .into_iter()
            .map(|result| result.into_record(include_abstract))
            .collect())
    }
}

#[async_trait]
impl Source for EuropePmcSource {
    fn id(&self) -> &str {
        "europe_pmc"
    }

    fn name(&self) -> &str {
        "Europe PMC"
    }

    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        let url = self.build_search_url(query);
        tracing::debug!("Europe PMC request: {}", url);

        let body = self.client.get_json(self.name(), self.client.get(&url)).await?;
        Self::parse_response(&body, query.include_abstract)
    }
}

// ===== Europe PMC API Types =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EuropePmcResult {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author_string: Option<String>,
    #[serde(default)]
    journal_title: Option<String>,
    #[serde(default)]
    pub_year: Option<Value>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    abstract_text: Option<String>,
}

impl EuropePmcResult {
    fn landing_page(&self) -> String {
        match (&self.source, &self.id) {
            (Some(source), Some(id)) => {
                format!("https://europepmc.org/article/{}/{}", source, id)
            }
            _ => String::new(),
        }
    }

    fn into_record(self, include_abstract: bool) -> NormalizedRecord {
        let landing_page = self.landing_page();
        let authors = self.author_string.unwrap_or_default();

        RecordBuilder::new("Europe PMC")
            .title(self.title.unwrap_or_default())
            .authors(authors.trim_end_matches('.').split(','))
            .journal(self.journal_title.unwrap_or_default())
            .year_value(self.pub_year.as_ref())
            .doi(self.doi.unwrap_or_default())
            .fallback_link(landing_page)
            .abstract_text(
                include_abstract,
                self.abstract_text.as_deref().map(strip_markup).as_deref(),
            )
            .build()
    }
}
