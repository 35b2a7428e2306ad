//! Semantic Scholar research source implementation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{container, decode_items, Source, SourceError};
use crate::utils::HttpClient;

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

/// Paper search accepts at most 100 results per call
const SEMANTIC_MAX_LIMIT: usize = 100;

const SEARCH_FIELDS: &str = "title,authors,year,url,externalIds,venue";

/// Semantic Scholar research source
///
/// Uses the Semantic Scholar Graph API paper search.
#[derive(Debug, Clone)]
pub struct SemanticScholarSource {
    client: Arc<HttpClient>,
    base_url: String,
    fetch_limit: usize,
    api_key: Option<String>,
}

impl SemanticScholarSource {
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: SEMANTIC_API_BASE.to_string(),
            fetch_limit: config.search.fetch_limit,
            api_key: config.api_keys.semantic_scholar_key(),
        }
    }

    /// Point the source at a different API host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_search_url(&self, query: &Query) -> String {
        let fields = if query.include_abstract {
            format!("{},abstract", SEARCH_FIELDS)
        } else {
            SEARCH_FIELDS.to_string()
        };

        format!(
            "{}/paper/search?query={}&limit={}&fields={}",
            self.base_url,
            urlencoding::encode(&query.text),
            self.fetch_limit.min(SEMANTIC_MAX_LIMIT),
            fields
        )
    }

    /// Add API key to request headers if available
    fn add_api_key_if_present(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref key) = self.api_key {
            builder.header("x-api-key", key)
        } else {
            builder
        }
    }

    fn parse_response(body: &Value, include_abstract: bool) -> Result<Vec<NormalizedRecord>, SourceError> {
        let items = container("Semantic Scholar", body, "/data")?;

        Ok(decode_items::<S2Paper>("Semantic Scholar", items)
            .into_iter()
            .map(|paper| paper.into_record(include_abstract))
            .collect())
    }
}

#[async_trait]
impl Source for SemanticScholarSource {
    fn id(&self) -> &str {
        "semantic"
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        let url = self.build_search_url(query);
        tracing::debug!("Semantic Scholar request: {}", url);

        let request = self.add_api_key_if_present(self.client.get(&url));
        let body = self.client.get_json(self.name(), request).await?;
        Self::parse_response(&body, query.include_abstract)
    }
}

// ===== Semantic Scholar API Types =====

#[derive(Debug, Deserialize)]
struct S2Paper {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Option<Vec<S2Author>>,
    #[serde(default)]
    venue: Option<String>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "externalIds", default)]
    external_ids: Option<S2ExternalIds>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DOI", default)]
    doi: Option<String>,
}

impl S2Paper {
    fn into_record(self, include_abstract: bool) -> NormalizedRecord {
        let authors = self
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.name)
            .collect::<Vec<_>>();

        RecordBuilder::new("Semantic Scholar")
            .title(self.title.unwrap_or_default())
            .authors(authors)
            .journal(self.venue.unwrap_or_default())
            .year_value(self.year.as_ref())
            .doi(self.external_ids.and_then(|ids| ids.doi).unwrap_or_default())
            .fallback_link(self.url.unwrap_or_default())
            .abstract_text(include_abstract, self.abstract_text.as_deref())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(base_url: &str) -> SemanticScholarSource {
        SemanticScholarSource::new(Arc::new(HttpClient::new().unwrap()), &Config::default())
            .with_base_url(base_url)
    }

    #[test]
    fn test_build_search_url_fields() {
        let plain = source(SEMANTIC_API_BASE).build_search_url(&Query::new("bert"));
        assert!(plain.contains("limit=50"));
        assert!(plain.ends_with("fields=title,authors,year,url,externalIds,venue"));

        let with_abstract =
            source(SEMANTIC_API_BASE).build_search_url(&Query::new("bert").include_abstract(true));
        assert!(with_abstract.ends_with(",abstract"));
    }

    #[test]
    fn test_parse_response_field_mapping() {
        let body = json!({
            "total": 2,
            "data": [{
                "paperId": "abc",
                "title": "BERT: Pre-training of Deep Bidirectional Transformers",
                "authors": [{"name": "Jacob Devlin"}, {"name": "Ming-Wei Chang"}],
                "venue": "NAACL",
                "year": 2019,
                "url": "https://www.semanticscholar.org/paper/abc",
                "externalIds": {"DOI": "10.18653/v1/N19-1423", "ArXiv": "1810.04805"}
            }, {
                "paperId": "def",
                "title": "Unpublished note",
                "authors": [],
                "year": null,
                "url": "https://www.semanticscholar.org/paper/def",
                "externalIds": {}
            }]
        });

        let records = SemanticScholarSource::parse_response(&body, false).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].doi, "10.18653/v1/N19-1423");
        assert_eq!(records[0].link, "https://doi.org/10.18653/v1/N19-1423");
        assert_eq!(records[0].year, "2019");
        assert_eq!(records[0].journal, "NAACL");
        assert_eq!(records[1].doi, "");
        assert_eq!(records[1].year, "");
        assert_eq!(records[1].link, "https://www.semanticscholar.org/paper/def");
    }

    #[test]
    fn test_parse_response_error_body() {
        let body = json!({"message": "Too Many Requests"});
        assert!(SemanticScholarSource::parse_response(&body, false).is_err());
    }

    #[tokio::test]
    async fn test_search_sends_api_key_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper/search")
            .match_query(mockito::Matcher::UrlEncoded("query".into(), "bert".into()))
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total": 0, "data": []}"#)
            .create_async()
            .await;

        let mut source = source(&server.url());
        source.api_key = Some("secret".to_string());

        let records = source.search(&Query::new("bert")).await.unwrap();
        mock.assert_async().await;
        assert!(records.is_empty());
    }
}
