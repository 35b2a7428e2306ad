//! Page slicing of the final ordered result set.

use crate::models::{NormalizedRecord, SearchPage};

/// Slice one page out of the full ordered list
///
/// `page` is 1-based. `total_results` is always the size of the full list; a
/// page past the end is empty. Offsets saturate instead of overflowing.
pub fn paginate(records: Vec<NormalizedRecord>, page: usize, page_size: usize) -> SearchPage {
    let total_results = records.len();
    let start = page.saturating_sub(1).saturating_mul(page_size).min(total_results);
    let end = start.saturating_add(page_size).min(total_results);

    let results = records.into_iter().skip(start).take(end - start).collect();

    SearchPage {
        results,
        total_results,
    }
}
