//! Exact-title-match ranking.

use crate::models::NormalizedRecord;

/// Move records whose title equals the query to the front
///
/// Titles and query are compared after trimming and lower-casing. The sort is
/// stable: matching records keep their relative order, as do the rest. A
/// blank query matches nothing.
pub fn rank(records: Vec<NormalizedRecord>, query: &str) -> Vec<NormalizedRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records;
    }

    let (mut exact, rest): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|record| record.title_matches(&needle));
    exact.extend(rest);
    exact
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::make_record;

    fn titles(records: &[NormalizedRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_exact_match_moves_first() {
        let records = vec![
            make_record("X", "Intro to Quantum", ""),
            make_record("X", "quantum computing", ""),
            make_record("X", "Other", ""),
        ];

        let ranked = rank(records, "Quantum Computing");
        assert_eq!(
            titles(&ranked),
            vec!["quantum computing", "Intro to Quantum", "Other"]
        );
    }

    #[test]
    fn test_rank_is_stable() {
        let records = vec![
            make_record("A", "Other 1", ""),
            make_record("A", "Graph Theory", "10.1/a"),
            make_record("B", "Other 2", ""),
            make_record("B", "  graph theory ", "10.1/b"),
        ];

        let ranked = rank(records, " graph THEORY");
        assert_eq!(ranked[0].doi, "10.1/a");
        assert_eq!(ranked[1].doi, "10.1/b");
        assert_eq!(titles(&ranked[2..]), vec!["Other 1", "Other 2"]);
    }

    #[test]
    fn test_rank_without_match_is_identity() {
        let records = vec![make_record("A", "b", ""), make_record("A", "a", "")];
        let ranked = rank(records.clone(), "zzz");
        assert_eq!(ranked, records);
    }
}
