//! # Research Aggregator
//!
//! Fan-out bibliographic search: one query is sent to many scholarly metadata
//! services at once, their answers are normalized into a single record shape,
//! merged, deduplicated by DOI, ranked, and paginated.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (NormalizedRecord, Query, SearchPage)
//! - [`sources`]: Source adapters behind the trait-based [`Source`] interface
//! - [`pipeline`]: Concurrent dispatch, merge, rank, and pagination
//! - [`server`]: HTTP API built on axum
//! - [`utils`]: HTTP client, deduplication, and other utilities
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal output helpers for the CLI
//!
//! ## Example
//!
//! ```rust,no_run
//! use research_aggregator::config::Config;
//! use research_aggregator::models::Query;
//! use research_aggregator::pipeline::SearchService;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = SearchService::from_config(&Config::default())?;
//! let page = service.search(&Query::new("quantum computing")).await?;
//! println!("{} of {} records", page.results.len(), page.total_results);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{NormalizedRecord, Query, SearchPage};
pub use pipeline::SearchService;
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
