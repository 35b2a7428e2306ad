//! PubMed research source implementation.
//!
//! PubMed needs two E-utilities calls per query: `esearch` returns matching
//! PMIDs, then a single batched `esummary` call returns their metadata. The
//! second call depends on the first, so the two run sequentially inside the
//! adapter; to the dispatcher the source is still one future.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{container, Source, SourceError};
use crate::utils::HttpClient;

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

const ESEARCH_MAX_RETMAX: usize = 10_000;

/// PubMed research source
///
/// Uses NCBI E-utilities (`esearch` + `esummary`) with JSON responses.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    base_url: String,
    fetch_limit: usize,
    api_key: Option<String>,
}

impl PubMedSource {
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: EUTILS_BASE.to_string(),
            fetch_limit: config.search.fetch_limit,
            api_key: config.api_keys.ncbi_key(),
        }
    }

    /// Point the source at a different API host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn with_api_key(&self, url: String) -> String {
        match &self.api_key {
            Some(key) => format!("{}&api_key={}", url, urlencoding::encode(key)),
            None => url,
        }
    }

    fn build_esearch_url(&self, query: &Query) -> String {
        self.with_api_key(format!(
            "{}/esearch.fcgi?db=pubmed&term={}&retmax={}&retmode=json",
            self.base_url,
            urlencoding::encode(&query.text),
            self.fetch_limit.min(ESEARCH_MAX_RETMAX)
        ))
    }

    fn build_esummary_url(&self, ids: &[String]) -> String {
        self.with_api_key(format!(
            "{}/esummary.fcgi?db=pubmed&id={}&retmode=json",
            self.base_url,
            ids.join(",")
        ))
    }

    /// Extract PMIDs from an esearch response, in relevance order
    fn parse_id_list(body: &Value) -> Result<Vec<String>, SourceError> {
        let ids = container("PubMed", body, "/esearchresult/idlist")?;

        Ok(ids
            .iter()
            .filter_map(|id| match id {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect())
    }

    /// Build records from an esummary response, following the order of `ids`
    ///
    /// An id with no summary entry produces no record.
    fn parse_summaries(
        body: &Value,
        ids: &[String],
        include_abstract: bool,
    ) -> Result<Vec<NormalizedRecord>, SourceError> {
        let result = body
            .get("result")
            .and_then(Value::as_object)
            .ok_or_else(|| SourceError::Schema("PubMed response is missing /result".to_string()))?;

        Ok(ids
            .iter()
            .filter_map(|id| {
                let entry = result.get(id)?;
                match PMSummary::deserialize(entry) {
                    Ok(summary) => Some(summary.into_record(id, include_abstract)),
                    Err(e) => {
                        tracing::debug!("PubMed: skipping summary {}: {}", id, e);
                        None
                    }
                }
            })
            .collect())
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        let search_url = self.build_esearch_url(query);
        tracing::debug!("PubMed esearch: {}", search_url);

        let search_body = self
            .client
            .get_json(self.name(), self.client.get(&search_url))
            .await?;
        let ids = Self::parse_id_list(&search_body)?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let summary_url = self.build_esummary_url(&ids);
        tracing::debug!("PubMed esummary for {} ids", ids.len());

        let summary_body = self
            .client
            .get_json(self.name(), self.client.get(&summary_url))
            .await?;
        Self::parse_summaries(&summary_body, &ids, query.include_abstract)
    }
}

// ===== E-utilities API Types =====

#[derive(Debug, Deserialize)]
struct PMSummary {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Option<Vec<PMAuthor>>,
    #[serde(default)]
    fulljournalname: Option<String>,
    #[serde(default)]
    pubdate: Option<String>,
    #[serde(default)]
    elocationid: Option<String>,
    #[serde(default)]
    articleids: Option<Vec<PMArticleId>>,
}

#[derive(Debug, Deserialize)]
struct PMAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PMArticleId {
    #[serde(default)]
    idtype: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl PMSummary {
    fn doi(&self) -> String {
        let from_elocation = self
            .elocationid
            .as_deref()
            .map(str::trim)
            .filter(|e| e.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("doi:")))
            .map(str::to_string);

        from_elocation
            .or_else(|| {
                self.articleids
                    .iter()
                    .flatten()
                    .find(|a| a.idtype.as_deref() == Some("doi"))
                    .and_then(|a| a.value.clone())
            })
            .unwrap_or_default()
    }

    fn into_record(self, pmid: &str, include_abstract: bool) -> NormalizedRecord {
        let doi = self.doi();
        let authors = self
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.name)
            .collect::<Vec<_>>();

        // esummary carries no abstract text
        RecordBuilder::new("PubMed")
            .title(self.title.unwrap_or_default())
            .authors(authors)
            .journal(self.fulljournalname.unwrap_or_default())
            .year(self.pubdate.unwrap_or_default())
            .doi(doi)
            .fallback_link(format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid))
            .abstract_text(include_abstract, None)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn source(base_url: &str) -> PubMedSource {
        PubMedSource::new(Arc::new(HttpClient::new().unwrap()), &Config::default())
            .with_base_url(base_url)
    }

    fn summary_body() -> String {
        json!({
            "header": {"type": "esummary"},
            "result": {
                "uids": ["111", "222"],
                "222": {
                    "uid": "222",
                    "title": "Second by relevance order",
                    "authors": [{"name": "Doe J"}],
                    "fulljournalname": "Nature",
                    "pubdate": "2019 Mar",
                    "elocationid": "",
                    "articleids": [
                        {"idtype": "pubmed", "value": "222"},
                        {"idtype": "doi", "value": "10.1038/s41586-019-0001-x"}
                    ]
                },
                "111": {
                    "uid": "111",
                    "title": "First by relevance order",
                    "authors": [{"name": "Roe R"}, {"name": "Poe P"}],
                    "fulljournalname": "Cell",
                    "pubdate": "2021 Jan 5",
                    "elocationid": "doi: 10.1016/j.cell.2021.01.001"
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_summaries_keeps_id_order_and_skips_missing() {
        let body: Value = serde_json::from_str(&summary_body()).unwrap();
        let ids = vec!["111".to_string(), "333".to_string(), "222".to_string()];

        let records = PubMedSource::parse_summaries(&body, &ids, false).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "First by relevance order");
        assert_eq!(records[0].doi, "10.1016/j.cell.2021.01.001");
        assert_eq!(records[0].year, "2021");
        assert_eq!(records[0].authors, "Roe R, Poe P");

        assert_eq!(records[1].doi, "10.1038/s41586-019-0001-x");
        assert_eq!(records[1].journal, "Nature");
    }

    #[test]
    fn test_link_falls_back_to_pubmed_page() {
        let body = json!({"result": {"999": {"title": "No DOI"}}});
        let records = PubMedSource::parse_summaries(&body, &["999".to_string()], false).unwrap();
        assert_eq!(records[0].link, "https://pubmed.ncbi.nlm.nih.gov/999/");
    }

    #[test]
    fn test_parse_id_list_missing_container() {
        let body = json!({"error": "API rate limit exceeded"});
        assert!(matches!(
            PubMedSource::parse_id_list(&body),
            Err(SourceError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_search_two_phase() {
        let mut server = mockito::Server::new_async().await;
        let esearch = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("term".into(), "cancer".into()),
                Matcher::UrlEncoded("retmax".into(), "50".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"esearchresult": {"count": "2", "idlist": ["111", "222"]}}"#)
            .expect(1)
            .create_async()
            .await;
        let esummary = server
            .mock("GET", "/esummary.fcgi")
            .match_query(Matcher::UrlEncoded("id".into(), "111,222".into()))
            .with_status(200)
            .with_body(summary_body())
            .expect(1)
            .create_async()
            .await;

        let records = source(&server.url())
            .search(&Query::new("cancer"))
            .await
            .unwrap();

        esearch.assert_async().await;
        esummary.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, "PubMed");
        assert_eq!(records[0].title, "First by relevance order");
    }

    #[tokio::test]
    async fn test_empty_id_list_skips_summary_call() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"esearchresult": {"count": "0", "idlist": []}}"#)
            .create_async()
            .await;
        let esummary = server
            .mock("GET", "/esummary.fcgi")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let records = source(&server.url())
            .search(&Query::new("zzzz"))
            .await
            .unwrap();

        esummary.assert_async().await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_summary_failure_fails_source() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"esearchresult": {"idlist": ["1"]}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/esummary.fcgi")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = source(&server.url())
            .search(&Query::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Api(_)));
    }
}
