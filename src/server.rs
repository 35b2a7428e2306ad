//! HTTP front end for the search pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/search?q=&page=&abstracts=` | One page of merged results |
//! | `GET`  | `/sources` | Registered sources, in merge order |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Errors are a JSON object with a single `error` string:
//!
//! ```json
//! { "error": "Missing query" }
//! ```
//!
//! A missing or blank `q` is a `400`. A panic inside a handler is caught and
//! answered with `500 {"error": "Internal server error"}`; its message is
//! logged, never returned. Individual source failures are not errors at this
//! level: the response is built from the sources that succeeded.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser front ends can
//! call the API directly.

use axum::{
    extract::{Query as QueryParams, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::models::{Query, SearchPage};
use crate::pipeline::SearchService;
use crate::utils::{parse_flag, parse_page};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    service: SearchService,
    page_size: usize,
}

impl AppState {
    pub fn new(service: SearchService, config: &Config) -> Self {
        Self {
            service,
            page_size: config.search.page_size.max(1),
        }
    }
}

/// Build the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/search", get(handle_search))
        .route("/sources", get(handle_sources))
        .route("/health", get(handle_health))
        .with_state(Arc::new(state))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the HTTP server on `[server].bind` and run until Ctrl-C
pub async fn run_server(config: &Config, service: SearchService) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let source_count = service.registry().len();
    let app = router(AppState::new(service, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        "Listening on http://{} with {} sources",
        listener.local_addr()?,
        source_count
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Error type that converts into an Axum HTTP response.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}

// ============ Handlers ============

/// Raw `/search` query string; everything is optional so that bad values
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    page: Option<String>,
    abstracts: Option<String>,
}

async fn handle_search(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<SearchPage>, ApiError> {
    let text = params.q.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::bad_request("Missing query"));
    }

    let query = Query::new(text)
        .page(parse_page(params.page.as_deref()))
        .page_size(state.page_size)
        .include_abstract(parse_flag(params.abstracts.as_deref()));

    let page = state
        .service
        .search(&query)
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    Ok(Json(page))
}

#[derive(Debug, Serialize)]
struct SourceInfo {
    id: String,
    name: String,
}

async fn handle_sources(State(state): State<Arc<AppState>>) -> Json<Vec<SourceInfo>> {
    Json(
        state
            .service
            .registry()
            .all()
            .iter()
            .map(|s| SourceInfo {
                id: s.id().to_string(),
                name: s.name().to_string(),
            })
            .collect(),
    )
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
