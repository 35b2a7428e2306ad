//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{Source, SourceError};

/// What a [`MockSource`] does when searched
#[derive(Debug, Clone)]
enum Behavior {
    Records(Vec<NormalizedRecord>),
    Fail(String),
    Panic(String),
}

/// A mock source for testing that returns predefined records, fails, or panics.
///
/// Every call to `search` is counted, including failing ones.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    name: String,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock source that returns no records
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            behavior: Behavior::Records(Vec::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return these records from every search
    pub fn with_records(mut self, records: Vec<NormalizedRecord>) -> Self {
        self.behavior = Behavior::Records(records);
        self
    }

    /// Fail every search with [`SourceError::Api`]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.behavior = Behavior::Fail(reason.into());
        self
    }

    /// Panic inside every search
    pub fn panicking(mut self, message: impl Into<String>) -> Self {
        self.behavior = Behavior::Panic(message.into());
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `search` has been called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Records(records) => Ok(records.clone()),
            Behavior::Fail(reason) => Err(SourceError::Api(reason.clone())),
            Behavior::Panic(message) => panic!("{}", message),
        }
    }
}

/// Helper function to create a record for testing.
pub fn make_record(source: &str, title: &str, doi: &str) -> NormalizedRecord {
    RecordBuilder::new(source)
        .title(title)
        .doi(doi)
        .fallback_link(format!("http://example.com/{}", title.replace(' ', "-")))
        .build()
}
