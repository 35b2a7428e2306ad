//! Integration tests for Research Aggregator
//!
//! These tests drive the search pipeline and the HTTP API end to end, using
//! mock sources in place of the upstream services.

use async_trait::async_trait;
use research_aggregator::config::Config;
use research_aggregator::models::{NormalizedRecord, Query};
use research_aggregator::pipeline::SearchService;
use research_aggregator::server::{router, AppState};
use research_aggregator::sources::mock::{make_record, MockSource};
use research_aggregator::sources::{Source, SourceError, SourceRegistry};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn expected_source_count() -> usize {
    [
        cfg!(feature = "source-crossref"),
        cfg!(feature = "source-openalex"),
        cfg!(feature = "source-semantic"),
        cfg!(feature = "source-doaj"),
        cfg!(feature = "source-arxiv"),
        cfg!(feature = "source-pubmed"),
        cfg!(feature = "source-europe_pmc"),
        cfg!(feature = "source-datacite"),
        cfg!(feature = "source-zenodo"),
    ]
    .iter()
    .filter(|enabled| **enabled)
    .count()
}

fn records(source: &str, titles: &[(&str, &str)]) -> Vec<NormalizedRecord> {
    titles
        .iter()
        .map(|(title, doi)| make_record(source, title, doi))
        .collect()
}

fn service(sources: Vec<Arc<dyn Source>>) -> SearchService {
    SearchService::new(SourceRegistry::with_sources(sources))
}

/// Serve the router on an ephemeral port and return its base URL
async fn spawn_app(service: SearchService) -> String {
    let app = router(AppState::new(service, &Config::default()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn get_json(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap();
    (status, body)
}

#[test]
fn test_default_registry_order() {
    let registry = SourceRegistry::from_config(&Config::default()).unwrap();
    assert_eq!(registry.len(), expected_source_count());

    #[cfg(feature = "full")]
    assert_eq!(
        registry.ids().collect::<Vec<_>>(),
        vec![
            "crossref",
            "openalex",
            "semantic",
            "doaj",
            "arxiv",
            "pubmed",
            "europe_pmc",
            "datacite",
            "zenodo"
        ]
    );
}

#[test]
fn test_invalid_query_handling() {
    assert!(Query::new("").validate().is_err());
    assert!(Query::new("  \t ").validate().is_err());
    assert!(Query::new("graphene").validate().is_ok());
    assert!(Query::new("graphene").page(0).validate().is_err());
}

#[tokio::test]
async fn test_pipeline_isolates_failures_and_dedupes() {
    let first = Arc::new(MockSource::new("first", "First").with_records(records(
        "First",
        &[("Graphene review", "10.1000/A"), ("Unrelated", "")],
    )));
    let broken = Arc::new(MockSource::new("broken", "Broken").failing("HTTP 503"));
    let exploding = Arc::new(MockSource::new("exploding", "Exploding").panicking("bad field"));
    let last = Arc::new(MockSource::new("last", "Last").with_records(records(
        "Last",
        &[("Copy of A", "https://doi.org/10.1000/a"), ("graphene", "10.1000/b")],
    )));

    let service = service(vec![first as Arc<dyn Source>, broken, exploding, last]);
    let page = service.search(&Query::new("Graphene")).await.unwrap();

    assert_eq!(page.total_results, 3);
    let titles: Vec<_> = page.results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["graphene", "Graphene review", "Unrelated"]);
    assert_eq!(page.results[1].source, "First");
}

#[tokio::test]
async fn test_pipeline_queries_sources_concurrently() {
    let sources: Vec<Arc<dyn Source>> = (0..4)
        .map(|i| {
            Arc::new(
                MockSource::new(format!("s{}", i), format!("S{}", i))
                    .with_delay(Duration::from_millis(200))
                    .with_records(records("S", &[("Slow", "")])),
            ) as Arc<dyn Source>
        })
        .collect();

    let started = Instant::now();
    let page = service(sources).search(&Query::new("slow")).await.unwrap();

    assert_eq!(page.total_results, 4);
    assert!(started.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn test_http_search_merges_sources() {
    let a = Arc::new(MockSource::new("a", "A").with_records(records(
        "A",
        &[("Deep learning", "10.1/dl"), ("Attention", "10.1/att")],
    )));
    let b = Arc::new(MockSource::new("b", "B").failing("timeout"));
    let c = Arc::new(
        MockSource::new("c", "C").with_records(records("C", &[("Deep Learning", "10.1/DL")])),
    );

    let base = spawn_app(service(vec![a as Arc<dyn Source>, b, c])).await;
    let (status, body) = get_json(&format!("{}/search?q=deep%20learning", base)).await;

    assert_eq!(status, 200);
    assert_eq!(body["totalResults"], 2);
    assert_eq!(body["results"][0]["title"], "Deep learning");
    assert_eq!(body["results"][0]["source"], "A");
    assert_eq!(body["results"][1]["title"], "Attention");
    assert!(body["results"][0].get("abstract").is_none());
}

#[tokio::test]
async fn test_http_missing_query_is_rejected() {
    let source = Arc::new(MockSource::new("a", "A"));
    let base = spawn_app(service(vec![source.clone() as Arc<dyn Source>])).await;

    for path in ["/search", "/search?q=", "/search?q=%20%20"] {
        let (status, body) = get_json(&format!("{}{}", base, path)).await;
        assert_eq!(status, 400);
        assert_eq!(body, serde_json::json!({ "error": "Missing query" }));
    }
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_http_pagination() {
    let titles: Vec<String> = (0..25).map(|i| format!("Result {}", i)).collect();
    let batch = titles
        .iter()
        .map(|t| make_record("A", t, ""))
        .collect::<Vec<_>>();
    let source: Arc<dyn Source> = Arc::new(MockSource::new("a", "A").with_records(batch));
    let base = spawn_app(service(vec![source])).await;

    let (_, body) = get_json(&format!("{}/search?q=result&page=3", base)).await;
    assert_eq!(body["totalResults"], 25);
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
    assert_eq!(body["results"][0]["title"], "Result 20");

    let (status, body) = get_json(&format!("{}/search?q=result&page=10", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["totalResults"], 25);
    assert!(body["results"].as_array().unwrap().is_empty());

    let (_, body) = get_json(&format!("{}/search?q=result&page=zero", base)).await;
    assert_eq!(body["results"][0]["title"], "Result 0");
}

#[tokio::test]
async fn test_http_all_sources_failing_is_empty_page() {
    let base = spawn_app(service(vec![
        Arc::new(MockSource::new("a", "A").failing("down")) as Arc<dyn Source>,
        Arc::new(MockSource::new("b", "B").panicking("unexpected shape")),
    ]))
    .await;

    let (status, body) = get_json(&format!("{}/search?q=anything", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body, serde_json::json!({ "results": [], "totalResults": 0 }));
}

#[tokio::test]
async fn test_http_sources_and_health() {
    let base = spawn_app(service(vec![
        Arc::new(MockSource::new("zeta", "Zeta")) as Arc<dyn Source>,
        Arc::new(MockSource::new("alpha", "Alpha")),
    ]))
    .await;

    let (status, body) = get_json(&format!("{}/sources", base)).await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        serde_json::json!([
            { "id": "zeta", "name": "Zeta" },
            { "id": "alpha", "name": "Alpha" }
        ])
    );

    let (status, body) = get_json(&format!("{}/health", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], research_aggregator::VERSION);
}

#[tokio::test]
async fn test_http_cors_allows_any_origin() {
    let base = spawn_app(service(vec![])).await;
    let response = reqwest::Client::new()
        .get(format!("{}/health", base))
        .header("Origin", "http://example.org")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

/// A source whose metadata accessors panic, so handlers that list sources blow up
#[derive(Debug)]
struct NamelessSource;

#[async_trait]
impl Source for NamelessSource {
    fn id(&self) -> &str {
        panic!("secret detail: id lookup failed")
    }

    fn name(&self) -> &str {
        panic!("secret detail: name lookup failed")
    }

    async fn search(&self, _query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_http_handler_panic_is_internal_error() {
    let base = spawn_app(service(vec![Arc::new(NamelessSource) as Arc<dyn Source>])).await;

    let response = reqwest::get(format!("{}/sources", base)).await.unwrap();
    assert_eq!(response.status().as_u16(), 500);
    let body = response.text().await.unwrap();
    assert_eq!(body, r#"{"error":"Internal server error"}"#);
    assert!(!body.contains("secret detail"));

    let (status, _) = get_json(&format!("{}/health", base)).await;
    assert_eq!(status, 200);
}
