//! Per-chunk metadata extraction.

use std::collections::BTreeSet;

use crate::types::{ChunkMetadata, ContentItem, DateRange};

/// Summarize a chunk's records.
///
/// Records without a usable timestamp still count toward `post_count` and the
/// score totals; they are only left out of the date range.
pub fn extract_metadata(items: &[ContentItem]) -> ChunkMetadata {
    let mut authors = BTreeSet::new();
    let mut total_score = 0i64;
    let mut earliest = None;
    let mut latest = None;

    for item in items {
        if let Some(ts) = item.created_at() {
            earliest = Some(earliest.map_or(ts, |e| ts.min(e)));
            latest = Some(latest.map_or(ts, |l| ts.max(l)));
        }

        if let Some(author) = item.qualifying_author() {
            authors.insert(author.to_string());
        }

        total_score += item.score();
    }

    let post_count = items.len();
    let avg_score = if post_count > 0 {
        total_score as f64 / post_count as f64
    } else {
        0.0
    };

    ChunkMetadata {
        post_count,
        date_range: DateRange {
            earliest: earliest.map(|t| t.format("%Y-%m-%d").to_string()),
            latest: latest.map(|t| t.format("%Y-%m-%d").to_string()),
        },
        unique_authors: authors.len(),
        authors,
        total_score,
        avg_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: serde_json::Value) -> ContentItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_metadata() {
        let items = vec![
            item(json!({"created_utc": 1704067200, "author": "alice", "score": 10})),
            item(json!({"created_utc": "1706745600", "author": "bob", "score": "4"})),
            item(json!({"created_utc": 1705000000, "author": "alice", "score": -2})),
        ];

        let meta = extract_metadata(&items);
        assert_eq!(meta.post_count, 3);
        assert_eq!(meta.date_range.earliest.as_deref(), Some("2024-01-01"));
        assert_eq!(meta.date_range.latest.as_deref(), Some("2024-02-01"));
        assert_eq!(meta.unique_authors, 2);
        assert_eq!(meta.total_score, 12);
        assert_eq!(meta.avg_score, 4.0);
    }

    #[test]
    fn test_excluded_authors() {
        let items = vec![
            item(json!({"author": "[deleted]"})),
            item(json!({"author": "AutoModerator"})),
            item(json!({"author": "carol"})),
            item(json!({})),
        ];

        let meta = extract_metadata(&items);
        assert!(!meta.authors.contains("[deleted]"));
        assert!(!meta.authors.contains("AutoModerator"));
        assert_eq!(meta.unique_authors, meta.authors.len());
        assert_eq!(meta.unique_authors, 1);
        assert_eq!(meta.post_count, 4);
    }

    #[test]
    fn test_bad_timestamps_still_count() {
        let items = vec![
            item(json!({"created_utc": "not a number", "score": 3})),
            item(json!({"score": 5})),
        ];

        let meta = extract_metadata(&items);
        assert_eq!(meta.post_count, 2);
        assert_eq!(meta.date_range, DateRange::default());
        assert_eq!(meta.total_score, 8);
    }

    #[test]
    fn test_empty_chunk() {
        let meta = extract_metadata(&[]);
        assert_eq!(meta.post_count, 0);
        assert_eq!(meta.avg_score, 0.0);
    }

    #[test]
    fn test_idempotent() {
        let items = vec![item(json!({"created_utc": 1704067200, "author": "dave", "score": 1}))];
        assert_eq!(extract_metadata(&items), extract_metadata(&items));
    }
}
