//! The search pipeline: `query → dispatch → merge → dedupe → rank → paginate`.
//!
//! [`SearchService`] owns the ordered source list and runs one query through
//! every stage. Each stage is also exposed as a free function so callers can
//! compose their own flow:
//!
//! - [`dispatch`]: query all sources concurrently, one [`SourceOutcome`] per source
//! - [`merge`]: concatenate successful batches in source order
//! - [`dedupe`](crate::utils::dedupe): drop repeated DOIs, first occurrence wins
//! - [`rank`]: stable partition putting exact title matches first
//! - [`paginate`]: slice the requested page and report the total
//!
//! [`SourceOutcome`]: crate::models::SourceOutcome

mod dispatch;
mod paginate;
mod rank;

pub use dispatch::{dispatch, merge};
pub use paginate::paginate;
pub use rank::rank;

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::models::{Query, SearchPage};
use crate::sources::{SourceError, SourceRegistry};
use crate::utils::{dedupe, ValidationError};

/// Runs queries against every registered source
#[derive(Debug, Clone)]
pub struct SearchService {
    registry: Arc<SourceRegistry>,
}

impl SearchService {
    pub fn new(registry: SourceRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Build the service with every source the configuration enables
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Ok(Self::new(SourceRegistry::from_config(config)?))
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Run a query through the whole pipeline
    ///
    /// The query is validated first; an invalid query never reaches a
    /// source. Source failures are not errors: the page is built from
    /// whatever the other sources returned.
    pub async fn search(&self, query: &Query) -> Result<SearchPage, ValidationError> {
        query.validate()?;

        let started = Instant::now();
        let outcomes = dispatch(self.registry.all(), query).await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;

        let merged = merge(outcomes);
        let merged_count = merged.len();

        let unique = dedupe(merged);
        let unique_count = unique.len();

        let ranked = rank(unique, &query.text);
        let page = paginate(ranked, query.page, query.page_size);

        tracing::info!(
            query = %query.text,
            page = query.page,
            succeeded,
            failed,
            merged = merged_count,
            unique = unique_count,
            total = page.total_results,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search complete"
        );

        Ok(page)
    }
}
