//! OpenAlex research source implementation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{container, decode_items, Source, SourceError};
use crate::utils::HttpClient;

const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// OpenAlex caps `per-page` at 200
const OPENALEX_MAX_PER_PAGE: usize = 200;

/// OpenAlex research source
///
/// Uses the OpenAlex REST API.
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: Arc<HttpClient>,
    base_url: String,
    fetch_limit: usize,
    email: Option<String>,
}

impl OpenAlexSource {
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: OPENALEX_API_BASE.to_string(),
            fetch_limit: config.search.fetch_limit,
            email: config.api_keys.contact_email(),
        }
    }

    /// Point the source at a different API host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_search_url(&self, query: &Query) -> String {
        let url = format!(
            "{}/works?search={}&per-page={}",
            self.base_url,
            urlencoding::encode(&query.text),
            self.fetch_limit.min(OPENALEX_MAX_PER_PAGE)
        );

        // Add email to request URL if available (for polite pool)
        match &self.email {
            Some(email) => format!("{}&mailto={}", url, urlencoding::encode(email)),
            None => url,
        }
    }

    fn parse_response(body: &Value, include_abstract: bool) -> Result<Vec<NormalizedRecord>, SourceError> {
        let items = container("OpenAlex", body, "/results")?;

        Ok(decode_items::<OAWork>("OpenAlex", items)
            .into_iter()
            .map(|work| work.into_record(include_abstract))
            .collect())
    }
}

#[async_trait]
impl Source for OpenAlexSource {
    fn id(&self) -> &str {
        "openalex"
    }

    fn name(&self) -> &str {
        "OpenAlex"
    }

    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        let url = self.build_search_url(query);
        tracing::debug!("OpenAlex request: {}", url);

        let body = self.client.get_json(self.name(), self.client.get(&url)).await?;
        Self::parse_response(&body, query.include_abstract)
    }
}

/// Rebuild abstract text from OpenAlex's word -> positions index
fn rebuild_abstract(index: &HashMap<String, Vec<usize>>) -> String {
    let mut positioned: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |p| (*p, word.as_str())))
        .collect();
    positioned.sort_by_key(|(p, _)| *p);

    positioned
        .into_iter()
        .map(|(_, word)| word)
        .collect::<Vec<_>>()
        .join(" ")
}

// ===== OpenAlex API Types =====

#[derive(Debug, Deserialize)]
struct OAWork {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    publication_year: Option<Value>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    authorships: Option<Vec<OAAuthorship>>,
    #[serde(default)]
    host_venue: Option<OANamed>,
    #[serde(default)]
    primary_location: Option<OALocation>,
    #[serde(default)]
    abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
}

#[derive(Debug, Deserialize)]
struct OAAuthorship {
    #[serde(default)]
    author: Option<OANamed>,
}

#[derive(Debug, Deserialize)]
struct OANamed {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OALocation {
    #[serde(default)]
    landing_page_url: Option<String>,
    #[serde(default)]
    source: Option<OANamed>,
}

impl OAWork {
    fn into_record(self, include_abstract: bool) -> NormalizedRecord {
        let authors = self
            .authorships
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.author.and_then(|author| author.display_name))
            .collect::<Vec<_>>();

        let journal = self
            .host_venue
            .and_then(|v| v.display_name)
            .or_else(|| {
                self.primary_location
                    .as_ref()
                    .and_then(|l| l.source.as_ref())
                    .and_then(|s| s.display_name.clone())
            })
            .unwrap_or_default();

        let landing_page = self
            .primary_location
            .and_then(|l| l.landing_page_url)
            .unwrap_or_default();

        let abstract_text = self.abstract_inverted_index.as_ref().map(rebuild_abstract);

        RecordBuilder::new("OpenAlex")
            .title(self.title.or(self.display_name).unwrap_or_default())
            .authors(authors)
            .journal(journal)
            .year_value(self.publication_year.as_ref())
            .doi(self.doi.unwrap_or_default())
            .fallback_link(landing_page)
            .fallback_link(self.id.unwrap_or_default())
            .abstract_text(include_abstract, abstract_text.as_deref())
            .build()
    }
}
