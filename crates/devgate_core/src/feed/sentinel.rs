//! Placeholder removal for raw partitions.

use crate::model::activity::StoredDocument;

/// Drops every sentinel document, keeping the order of the rest.
pub fn filter_sentinels(documents: Vec<StoredDocument>) -> Vec<StoredDocument> {
    documents
        .into_iter()
        .filter(|document| !document.is_sentinel())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::filter_sentinels;
    use crate::model::activity::{StoredDocument, SENTINEL_ID};
    use serde_json::json;

    fn document(id: &str) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            body: json!({}),
            created_at: None,
            modified_at: None,
        }
    }

    #[test]
    fn removes_only_the_reserved_id() {
        let kept = filter_sentinels(vec![
            document("a"),
            document(SENTINEL_ID),
            document("Init"),
            document("b"),
        ]);
        let ids: Vec<&str> = kept.iter().map(|document| document.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "Init", "b"]);
    }

    #[test]
    fn empty_and_sentinel_only_partitions_yield_nothing() {
        assert!(filter_sentinels(Vec::new()).is_empty());
        assert!(filter_sentinels(vec![document(SENTINEL_ID)]).is_empty());
    }
}
