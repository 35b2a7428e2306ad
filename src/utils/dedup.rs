//! Deduplication of records across sources.

use std::collections::HashSet;

use crate::models::NormalizedRecord;

/// Remove records whose DOI was already seen earlier in the sequence
///
/// The key is the lower-cased DOI. The first occurrence wins regardless of
/// which source produced it, and no fields are merged from later duplicates.
/// Records without a DOI are always kept.
pub fn dedupe(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());

    records
        .into_iter()
        .filter(|record| match record.dedup_key() {
            Some(key) => seen.insert(key),
            None => true,
        })
        .collect()
}
