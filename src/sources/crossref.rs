//! Crossref research source implementation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{container, decode_items, Source, SourceError};
use crate::utils::{strip_markup, HttpClient};

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// Crossref caps `rows` at 1000
const CROSSREF_MAX_ROWS: usize = 1000;

/// Crossref research source
///
/// Uses the Crossref REST API `/works` search.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: Arc<HttpClient>,
    base_url: String,
    fetch_limit: usize,
    mailto: Option<String>,
}

impl CrossRefSource {
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: CROSSREF_API_BASE.to_string(),
            fetch_limit: config.search.fetch_limit,
            mailto: config.api_keys.contact_email(),
        }
    }

    /// Point the source at a different API host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_search_url(&self, query: &Query) -> String {
        let mut url = format!(
            "{}/works?query={}&rows={}",
            self.base_url,
            urlencoding::encode(&query.text),
            self.fetch_limit.min(CROSSREF_MAX_ROWS)
        );

        // Polite pool
        if let Some(mailto) = &self.mailto {
            url = format!("{}&mailto={}", url, urlencoding::encode(mailto));
        }

        url
    }

    fn parse_response(body: &Value, include_abstract: bool) -> Result<Vec<NormalizedRecord>, SourceError> {
        let items = container("Crossref", body, "/message/items")?;

        Ok(decode_items::<CRItem>("Crossref", items)
            .into_iter()
            .map(|item| item.into_record(include_abstract))
            .collect())
    }
}

#[async_trait]
impl Source for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "Crossref"
    }

    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        let url = self.build_search_url(query);
        tracing::debug!("Crossref request: {}", url);

        let body = self.client.get_json(self.name(), self.client.get(&url)).await?;
        Self::parse_response(&body, query.include_abstract)
    }
}

// ===== Crossref API Types =====

#[derive(Debug, Deserialize)]
struct CRItem {
    #[serde(default)]
    title: Option<Vec<String>>,
    #[serde(default)]
    author: Option<Vec<CRAuthor>>,
    #[serde(rename = "container-title", default)]
    container_title: Option<Vec<String>>,
    #[serde(default)]
    created: Option<Value>,
    #[serde(default)]
    issued: Option<Value>,
    #[serde(rename = "DOI", default)]
    doi: Option<String>,
    #[serde(rename = "URL", default)]
    url: Option<String>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRAuthor {
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl CRAuthor {
    fn display_name(&self) -> String {
        match (&self.given, &self.family) {
            (None, None) => self.name.clone().unwrap_or_default(),
            (given, family) => format!(
                "{} {}",
                given.as_deref().unwrap_or(""),
                family.as_deref().unwrap_or("")
            ),
        }
    }
}

impl CRItem {
    fn into_record(self, include_abstract: bool) -> NormalizedRecord {
        let year = date_parts(self.created.as_ref()).or_else(|| date_parts(self.issued.as_ref()));

        RecordBuilder::new("Crossref")
            .title(first(&self.title))
            .authors(self.author.unwrap_or_default().iter().map(CRAuthor::display_name))
            .journal(first(&self.container_title))
            .year_value(year)
            .doi(self.doi.unwrap_or_default())
            .fallback_link(self.url.unwrap_or_default())
            .abstract_text(
                include_abstract,
                self.abstract_text.as_deref().map(strip_markup).as_deref(),
            )
            .build()
    }
}

fn first(values: &Option<Vec<String>>) -> &str {
    values
        .as_ref()
        .and_then(|v| v.first())
        .map(String::as_str)
        .unwrap_or("")
}

fn date_parts(date: Option<&Value>) -> Option<&Value> {
    date.and_then(|d| d.get("date-parts"))
        .filter(|parts| !crate::models::year_from_value(parts).is_empty())
}
