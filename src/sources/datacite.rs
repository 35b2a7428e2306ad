//! DataCite research source implementation.
//!
//! DataCite registers DOIs for datasets, software and other research outputs.
//! API documentation: <https://support.datacite.org/docs/api>

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{container, decode_items, Source, SourceError};
use crate::utils::HttpClient;

const DATACITE_API_BASE: &str = "https://api.datacite.org";

const DATACITE_MAX_PAGE_SIZE: usize = 1000;

/// DataCite research source
#[derive(Debug, Clone)]
pub struct DataCiteSource {
    client: Arc<HttpClient>,
    base_url: String,
    fetch_limit: usize,
}

impl DataCiteSource {
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: DATACITE_API_BASE.to_string(),
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
            "{}/dois?query={}&page[size]={}",
            self.base_url,
            urlencoding::encode(&query.text),
            self.fetch_limit.min(DATACITE_MAX_PAGE_SIZE)
        )
    }

    fn parse_response(body: &Value, include_abstract: bool) -> Result<Vec<NormalizedRecord>, SourceError> {
        let items = container("DataCite", body, "/data")?;

        Ok(decode_items::<DataCiteItem>("DataCite", items)
            .into_iter()
            .filter_map(|item| item.attributes)
            .map(|attributes| attributes.into_record(include_abstract))
            .collect())
    }
}

#[async_trait]
impl Source for DataCiteSource {
    fn id(&self) -> &str {
        "datacite"
    }

    fn name(&self) -> &str {
        "DataCite"
    }

    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        let url = self.build_search_url(query);
        tracing::debug!("DataCite request: {}", url);

        let body = self.client.get_json(self.name(), self.client.get(&url)).await?;
        Self::parse_response(&body, query.include_abstract)
    }
}

// ===== DataCite API Types =====

#[derive(Debug, Deserialize)]
struct DataCiteItem {
    #[serde(default)]
    attributes: Option<DataCiteAttributes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataCiteAttributes {
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    titles: Option<Vec<DataCiteTitle>>,
    #[serde(default)]
    creators: Option<Vec<DataCiteCreator>>,
    #[serde(default)]
    publisher: Option<Publisher>,
    #[serde(default)]
    publication_year: Option<Value>,
    #[serde(default)]
    descriptions: Option<Vec<DataCiteDescription>>,
}

#[derive(Debug, Deserialize)]
struct DataCiteTitle {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataCiteCreator {
    #[serde(default)]
    name: Option<String>,
}

/// Publisher is a plain string in older responses and an object in newer ones
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Publisher {
    Name(String),
    Object {
        #[serde(default)]
        name: Option<String>,
    },
}

impl Publisher {
    fn into_name(self) -> String {
        match self {
            Publisher::Name(name) => name,
            Publisher::Object { name } => name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataCiteDescription {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    description_type: Option<String>,
}

impl DataCiteAttributes {
    fn into_record(self, include_abstract: bool) -> NormalizedRecord {
        let title = self
            .titles
            .unwrap_or_default()
            .into_iter()
            .find_map(|t| t.title)
            .unwrap_or_default();

        let description = self
            .descriptions
            .unwrap_or_default()
            .into_iter()
            .find(|d| d.description_type.as_deref() == Some("Abstract"))
            .and_then(|d| d.description);

        let authors = self
            .creators
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.name)
            .collect::<Vec<_>>();

        RecordBuilder::new("DataCite")
            .title(title)
            .authors(authors)
            .journal(self.publisher.map(Publisher::into_name).unwrap_or_default())
            .year_value(self.publication_year.as_ref())
            .doi(self.doi.unwrap_or_default())
            .fallback_link(self.url.unwrap_or_default())
            .abstract_text(include_abstract, description.as_deref())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response_publisher_shapes() {
        let body = json!({
            "data": [{
                "id": "10.5281/zenodo.1",
                "type": "dois",
                "attributes": {
                    "doi": "10.5281/ZENODO.1",
                    "url": "https://zenodo.org/record/1",
                    "titles": [{"title": "Ocean temperature dataset"}],
                    "creators": [{"name": "Ng, Sam"}, {"name": "Ito, Kai"}],
                    "publisher": "Zenodo",
                    "publicationYear": 2022,
                    "descriptions": [
                        {"description": "v1", "descriptionType": "Other"},
                        {"description": "Temperatures   at depth.", "descriptionType": "Abstract"}
                    ]
                }
            }, {
                "id": "x",
                "attributes": {
                    "titles": [],
                    "publisher": {"name": "Dryad"},
                    "publicationYear": "2015",
                    "url": "https://datadryad.org/x"
                }
            }]
        });

        let records = DataCiteSource::parse_response(&body, true).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "Ocean temperature dataset");
        assert_eq!(records[0].authors, "Ng, Sam, Ito, Kai");
        assert_eq!(records[0].journal, "Zenodo");
        assert_eq!(records[0].year, "2022");
        assert_eq!(records[0].doi, "10.5281/ZENODO.1");
        assert_eq!(records[0].r#abstract.as_deref(), Some("Temperatures at depth."));

        assert_eq!(records[1].title, "");
        assert_eq!(records[1].journal, "Dryad");
        assert_eq!(records[1].year, "2015");
        assert_eq!(records[1].link, "https://datadryad.org/x");
    }

    #[test]
    fn test_parse_response_missing_data() {
        let body = json!({"errors": [{"status": "400"}]});
        assert!(matches!(
            DataCiteSource::parse_response(&body, false),
            Err(SourceError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/dois")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("query".into(), "ocean".into()),
                mockito::Matcher::UrlEncoded("page[size]".into(), "50".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/vnd.api+json")
            .with_body(r#"{"data": [{"attributes": {"doi": "10.1/a", "titles": [{"title": "A"}]}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let source = DataCiteSource::new(Arc::new(HttpClient::new().unwrap()), &Config::default())
            .with_base_url(server.url());
        let records = source.search(&Query::new("ocean")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(records[0].link, "https://doi.org/10.1/a");
    }
}
