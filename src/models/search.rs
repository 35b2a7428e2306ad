//! Search request and response models.

use serde::{Deserialize, Serialize};

use crate::models::NormalizedRecord;
use crate::utils::ValidationError;

/// Default number of results per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Search query parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Free-text search string
    pub text: String,

    /// 1-based page number
    pub page: usize,

    /// Results per page
    pub page_size: usize,

    /// Whether records should carry abstracts
    pub include_abstract: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            text: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            include_abstract: false,
        }
    }
}

impl Query {
    /// Create a new query for the first page
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set page number
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Set page size
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Enable/disable abstracts
    pub fn include_abstract(mut self, include: bool) -> Self {
        self.include_abstract = include;
        self
    }

    /// Index of the first record on this page
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Reject blank text and zero page numbers or sizes
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        if self.page == 0 {
            return Err(ValidationError::InvalidPage(self.page));
        }
        if self.page_size == 0 {
            return Err(ValidationError::InvalidPageSize(self.page_size));
        }
        Ok(())
    }
}

/// Result of querying a single source
///
/// A source either yields its whole parsed batch or fails as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Records in the order the source returned them
    Success(Vec<NormalizedRecord>),
    /// The source failed; the reason is for logs only
    Failed(String),
}

impl SourceOutcome {
    /// Whether the source succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, SourceOutcome::Success(_))
    }

    /// Number of records carried (0 for failures)
    pub fn record_count(&self) -> usize {
        match self {
            SourceOutcome::Success(records) => records.len(),
            SourceOutcome::Failed(_) => 0,
        }
    }
}

/// One page of the merged result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Records on this page
    pub results: Vec<NormalizedRecord>,

    /// Size of the full merged, deduplicated set
    pub total_results: usize,
}

impl SearchPage {
    /// Create an empty page
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total_results: 0,
        }
    }
}
