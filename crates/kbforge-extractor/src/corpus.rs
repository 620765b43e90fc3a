//! Corpus merging: expand a job request into the flat item list

use crate::error::ExtractorError;
use kbforge_domain::traits::ContentStore;
use kbforge_domain::{ContentItem, ItemId, JobRequest};
use std::fmt::Display;
use tracing::debug;

fn join_ids<T: Display>(ids: &[T]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Resolve a request into the ordered items to extract from
///
/// Order is: directly requested items, then each collection's members in
/// collection order. An item reached through several routes appears once per
/// route. Every unresolvable id is reported in a single
/// [`ExtractorError::Validation`] before anything is returned.
pub fn merge_corpus<S>(store: &S, request: &JobRequest) -> Result<Vec<ContentItem>, ExtractorError>
where
    S: ContentStore,
    S::Error: Display,
{
    let store_error = |e: S::Error| ExtractorError::Store(e.to_string());

    let mut corpus = Vec::new();
    let mut missing_items: Vec<ItemId> = Vec::new();
    let mut missing_collections = Vec::new();

    for &id in &request.item_ids {
        match store.get_item(id).map_err(store_error)? {
            Some(item) => corpus.push(item),
            None => missing_items.push(id),
        }
    }

    let mut collections = Vec::new();
    for &id in &request.collection_ids {
        match store.get_collection(id).map_err(store_error)? {
            Some(collection) => collections.push(collection),
            None => missing_collections.push(id),
        }
    }

    let mut missing_members = Vec::new();
    for collection in &collections {
        for &member in &collection.members {
            match store.get_item(member).map_err(store_error)? {
                Some(item) => corpus.push(item),
                None => missing_members.push(format!("{} (in collection {})", member, collection.id)),
            }
        }
    }

    let mut problems = Vec::new();
    if !missing_items.is_empty() {
        problems.push(format!("unknown item ids: {}", join_ids(&missing_items)));
    }
    if !missing_collections.is_empty() {
        problems.push(format!("unknown collection ids: {}", join_ids(&missing_collections)));
    }
    if !missing_members.is_empty() {
        problems.push(format!("unknown member items: {}", missing_members.join(", ")));
    }
    if !problems.is_empty() {
        return Err(ExtractorError::Validation(problems.join("; ")));
    }

    debug!(
        "Merged corpus of {} items from {} direct ids and {} collections",
        corpus.len(),
        request.item_ids.len(),
        collections.len()
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbforge_domain::{Collection, CollectionId, CollectionKind, ContentKind};
    use kbforge_store::SqliteStore;

    fn seeded_store() -> SqliteStore {
        let mut store = SqliteStore::new(":memory:").unwrap();
        for id in 1..=4 {
            store
                .insert_item(&ContentItem::new(
                    ItemId(id),
                    ContentKind::Idea,
                    format!("Idea {}", id),
                    format!("text {}", id),
                    "2024-01-01",
                ))
                .unwrap();
        }
        store
            .insert_collection(&Collection {
                id: CollectionId(10),
                kind: CollectionKind::Group,
                name: "first".to_string(),
                members: vec![ItemId(3), ItemId(1)],
            })
            .unwrap();
        store
            .insert_collection(&Collection {
                id: CollectionId(20),
                kind: CollectionKind::Domain,
                name: "second".to_string(),
                members: vec![ItemId(4)],
            })
            .unwrap();
        store
    }

    fn ids(items: &[ContentItem]) -> Vec<i64> {
        items.iter().map(|i| i.id.0).collect()
    }

    #[test]
    fn test_direct_items_then_collections() {
        let store = seeded_store();
        let request = JobRequest::new(
            vec![ItemId(2), ItemId(1)],
            vec![CollectionId(20), CollectionId(10)],
        );
        let corpus = merge_corpus(&store, &request).unwrap();
        assert_eq!(ids(&corpus), vec![2, 1, 4, 3, 1]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let store = seeded_store();
        let request = JobRequest::new(vec![ItemId(1)], vec![CollectionId(10)]);
        let corpus = merge_corpus(&store, &request).unwrap();
        assert_eq!(ids(&corpus), vec![1, 3, 1]);
    }

    #[test]
    fn test_empty_request() {
        let store = seeded_store();
        assert!(merge_corpus(&store, &JobRequest::default()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_ids_reported_together() {
        let store = seeded_store();
        let request = JobRequest::new(vec![ItemId(1), ItemId(99)], vec![CollectionId(77)]);
        match merge_corpus(&store, &request) {
            Err(ExtractorError::Validation(msg)) => {
                assert!(msg.contains("99"));
                assert!(msg.contains("77"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_member_is_a_validation_error() {
        let mut store = seeded_store();
        store
            .insert_collection(&Collection {
                id: CollectionId(30),
                kind: CollectionKind::Group,
                name: "dangling".to_string(),
                members: vec![ItemId(1), ItemId(500)],
            })
            .unwrap();

        let request = JobRequest::new(vec![], vec![CollectionId(30)]);
        assert!(matches!(
            merge_corpus(&store, &request),
            Err(ExtractorError::Validation(_))
        ));
    }
}
