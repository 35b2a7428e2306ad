//! Concurrent fan-out to every source, with per-source failure isolation.

use futures_util::future::join_all;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::models::{NormalizedRecord, Query, SourceOutcome};
use crate::sources::Source;

/// Query every source at once and collect one outcome per source
///
/// Outcomes come back in the same order as `sources`, whatever order the
/// sources finish in. Errors and panics in a source become
/// [`SourceOutcome::Failed`] and never affect the other sources. Dropping
/// the returned future drops every in-flight source request.
pub async fn dispatch(sources: &[Arc<dyn Source>], query: &Query) -> Vec<SourceOutcome> {
    join_all(sources.iter().map(|source| isolated(source.as_ref(), query))).await
}

/// Run one source, converting both `Err` and panics into an outcome
async fn isolated(source: &dyn Source, query: &Query) -> SourceOutcome {
    let started = Instant::now();
    let result = AssertUnwindSafe(source.search(query)).catch_unwind().await;
    let elapsed = started.elapsed();

    match result {
        Ok(Ok(records)) => {
            tracing::info!(
                source = source.id(),
                records = records.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Source succeeded"
            );
            SourceOutcome::Success(records)
        }
        Ok(Err(e)) => {
            tracing::warn!(
                source = source.id(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Source failed: {}",
                e
            );
            SourceOutcome::Failed(e.to_string())
        }
        Err(panic) => {
            let reason = format!("panicked: {}", panic_message(panic.as_ref()));
            tracing::warn!(
                source = source.id(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Source failed: {}",
                reason
            );
            SourceOutcome::Failed(reason)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Concatenate successful batches in source order, ignoring failures
pub fn merge(outcomes: Vec<SourceOutcome>) -> Vec<NormalizedRecord> {
    outcomes
        .into_iter()
        .flat_map(|outcome| match outcome {
            SourceOutcome::Success(records) => records,
            SourceOutcome::Failed(_) => Vec::new(),
        })
        .collect()
}
