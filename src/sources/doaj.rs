//! DOAJ (Directory of Open Access Journals) research source implementation.
//!
//! Uses the DOAJ article search API.
//! API documentation: <https://doaj.org/api/v2>
//!
//! DOAJ is free and requires no API key for basic search.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{container, decode_items, Source, SourceError};
use crate::utils::HttpClient;

const DOAJ_API_BASE: &str = "https://doaj.org/api/v2";

const DOAJ_MAX_PAGE_SIZE: usize = 100;

/// DOAJ research source
///
/// Free to use with no API key required.
#[derive(Debug, Clone)]
pub struct DoajSource {
    client: Arc<HttpClient>,
    base_url: String,
    fetch_limit: usize,
}

impl DoajSource {
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: DOAJ_API_BASE.to_string(),
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
            "{}/search/articles?q={}&pageSize={}",
            self.base_url,
            urlencoding::encode(&query.text),
            self.fetch_limit.min(DOAJ_MAX_PAGE_SIZE)
        )
    }

    fn parse_response(body: &Value, include_abstract: bool) -> Result<Vec<NormalizedRecord>, SourceError> {
        let items = container("DOAJ", body, "/results")?;

        Ok(decode_items::<DoajArticle>("DOAJ", items)
            .into_iter()
            .filter_map(|article| article.bibjson)
            .map(|bibjson| bibjson.into_record(include_abstract))
            .collect())
    }
}

#[async_trait]
impl Source for DoajSource {
    fn id(&self) -> &str {
        "doaj"
    }

    fn name(&self) -> &str {
        "DOAJ"
    }

    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        let url = self.build_search_url(query);
        tracing::debug!("DOAJ request: {}", url);

        let body = self.client.get_json(self.name(), self.client.get(&url)).await?;
        Self::parse_response(&body, query.include_abstract)
    }
}

// ===== DOAJ API Types =====

#[derive(Debug, Deserialize)]
struct DoajArticle {
    #[serde(default)]
    bibjson: Option<DoajBibJson>,
}

#[derive(Debug, Deserialize)]
struct DoajBibJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<Vec<DoajAuthor>>,
    #[serde(default)]
    journal: Option<DoajJournal>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    identifier: Option<Vec<DoajIdentifier>>,
    #[serde(default)]
    link: Option<Vec<DoajLink>>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoajAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoajJournal {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoajIdentifier {
    #[serde(rename = "type", default)]
    id_type: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoajLink {
    #[serde(default)]
    url: Option<String>,
}

impl DoajBibJson {
    fn into_record(self, include_abstract: bool) -> NormalizedRecord {
        let doi = self
            .identifier
            .unwrap_or_default()
            .into_iter()
            .find(|i| {
                i.id_type
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case("doi"))
            })
            .and_then(|i| i.id)
            .unwrap_or_default();

        let link = self
            .link
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|l| l.url)
            .unwrap_or_default();

        let authors = self
            .author
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.name)
            .collect::<Vec<_>>();

        RecordBuilder::new("DOAJ")
            .title(self.title.unwrap_or_default())
            .authors(authors)
            .journal(self.journal.and_then(|j| j.title).unwrap_or_default())
            .year_value(self.year.as_ref())
            .doi(doi)
            .fallback_link(link)
            .abstract_text(include_abstract, self.abstract_text.as_deref())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response_field_mapping() {
        let body = json!({
            "total": 3,
            "results": [{
                "id": "a1",
                "bibjson": {
                    "title": "Open Access Trends",
                    "author": [{"name": "Ana Silva"}, {"name": ""}, {"name": "Ben Ode"}],
                    "journal": {"title": "PLOS ONE"},
                    "year": "2020",
                    "identifier": [
                        {"type": "eissn", "id": "1932-6203"},
                        {"type": "DOI", "id": "10.1371/journal.pone.0000001"}
                    ],
                    "link": [{"type": "fulltext", "url": "https://journals.plos.org/x"}],
                    "abstract": "We measure open access."
                }
            }, {
                "id": "a2",
                "bibjson": {
                    "title": "No identifiers",
                    "link": [{"url": "https://example.org/fulltext"}]
                }
            }, {
                "id": "a3"
            }]
        });

        let records = DoajSource::parse_response(&body, true).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].authors, "Ana Silva, Ben Ode");
        assert_eq!(records[0].journal, "PLOS ONE");
        assert_eq!(records[0].year, "2020");
        assert_eq!(records[0].doi, "10.1371/journal.pone.0000001");
        assert_eq!(records[0].r#abstract.as_deref(), Some("We measure open access."));

        assert_eq!(records[1].doi, "");
        assert_eq!(records[1].link, "https://example.org/fulltext");
    }

    #[test]
    fn test_parse_response_missing_results() {
        let body = json!({"error": "bad query"});
        assert!(matches!(
            DoajSource::parse_response(&body, false),
            Err(SourceError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search/articles")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("q".into(), "open science".into()),
                mockito::Matcher::UrlEncoded("pageSize".into(), "50".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"results": [{"bibjson": {"title": "Open science"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let source = DoajSource::new(Arc::new(HttpClient::new().unwrap()), &Config::default())
            .with_base_url(server.url());
        let records = source.search(&Query::new("open science")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "DOAJ");
    }
}
