//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{
        merge_corpus, ExtractorConfig, ExtractorError, GraphDocument, KnowledgeAggregator,
        RelationExtractor,
    };
    use kbforge_domain::{
        Collection, CollectionId, CollectionKind, ContentItem, ContentKind, ItemId, JobRequest,
        RelationTriple, SpanBoundary,
    };
    use kbforge_model::MockRelationModel;
    use kbforge_store::SqliteStore;

    const PARIS: &str = "<triplet> Paris <subj> France <obj> capital of";

    fn seeded_store() -> SqliteStore {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let items = [
            (1, ContentKind::Idea, "Paris is the capital of France."),
            (2, ContentKind::KnowledgeSource, "France's capital, Paris, hosts the Louvre."),
            (3, ContentKind::KnowledgeSource, "Rome is the capital of Italy."),
        ];
        for (id, kind, text) in items {
            store
                .insert_item(&ContentItem::new(ItemId(id), kind, format!("Item {}", id), text, "2024-01-01"))
                .unwrap();
        }
        store
            .insert_collection(&Collection {
                id: CollectionId(10),
                kind: CollectionKind::Domain,
                name: "Europe".to_string(),
                members: vec![ItemId(2), ItemId(3)],
            })
            .unwrap();
        store
    }

    fn capitals_model() -> MockRelationModel {
        let mut model = MockRelationModel::new(Vec::<String>::new());
        model.add_response("Paris", [PARIS]);
        model.add_response("Rome", ["<triplet> Rome <subj> Italy <obj> capital of"]);
        model
    }

    #[test]
    fn test_full_extraction_flow() {
        let store = seeded_store();
        let model = capitals_model();
        let extractor = RelationExtractor::new(model.clone(), ExtractorConfig::default());

        let request = JobRequest::new(vec![ItemId(1)], vec![CollectionId(10)]);
        let corpus = merge_corpus(&store, &request).unwrap();
        let extraction = extractor.extract(&corpus, None).unwrap();

        assert_eq!(model.call_count(), 3);
        assert_eq!(extraction.graph.len(), 2);

        // Two items independently yield the same relation
        let paris = extraction
            .graph
            .find(&RelationTriple::new("Paris", "capital of", "France"))
            .unwrap();
        assert_eq!(paris.spans.len(), 2);
        assert_eq!(paris.spans[0].item_id, ItemId(1));
        assert_eq!(paris.spans[1].item_id, ItemId(2));
        assert_eq!(extraction.graph.records[0].triple.head, "Paris");
    }

    #[test]
    fn test_duplicate_item_costs_calls_not_relations() {
        let store = seeded_store();
        let model = capitals_model();
        let extractor = RelationExtractor::new(model.clone(), ExtractorConfig::default());

        // Item 2 requested directly and through its domain
        let request = JobRequest::new(vec![ItemId(2)], vec![CollectionId(10)]);
        let corpus = merge_corpus(&store, &request).unwrap();
        let extraction = extractor.extract(&corpus, None).unwrap();

        assert_eq!(model.call_count(), 3);
        let paris = extraction
            .graph
            .find(&RelationTriple::new("Paris", "capital of", "France"))
            .unwrap();
        assert_eq!(paris.spans.len(), 1);
    }

    #[test]
    fn test_unresolvable_collection_makes_no_model_calls() {
        let store = seeded_store();
        let model = capitals_model();

        let request = JobRequest::new(vec![ItemId(1)], vec![CollectionId(404)]);
        let result = merge_corpus(&store, &request);

        assert!(matches!(result, Err(ExtractorError::Validation(_))));
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn test_model_failure_mid_extraction() {
        let store = seeded_store();
        let model = capitals_model().fail_after(1);
        let extractor = RelationExtractor::new(model, ExtractorConfig::default());

        let corpus = merge_corpus(&store, &JobRequest::new(vec![ItemId(1), ItemId(3)], vec![])).unwrap();
        assert!(matches!(
            extractor.extract_to_json(&corpus, None),
            Err(ExtractorError::Model(_))
        ));
    }

    #[test]
    fn test_artifact_round_trip_through_document() {
        let store = seeded_store();
        let config = ExtractorConfig {
            include_item_ids: true,
            ..Default::default()
        };
        let extractor = RelationExtractor::new(capitals_model(), config);

        let corpus = merge_corpus(&store, &JobRequest::new(vec![ItemId(1), ItemId(2)], vec![])).unwrap();
        let (json, stats) = extractor.extract_to_json(&corpus, None).unwrap();

        assert_eq!(stats.items, 2);
        let doc = GraphDocument::from_json(&json).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.relations[0].meta.items, Some(vec![1, 2]));
        assert_eq!(doc.relations[0].meta.spans.len(), 2);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let insertions = [
            (RelationTriple::new("A", "B", "C"), ItemId(1), SpanBoundary::new(0, 10)),
            (RelationTriple::new("X", "r", "Y"), ItemId(1), SpanBoundary::new(8, 18)),
            (RelationTriple::new("A", "B", "C"), ItemId(2), SpanBoundary::new(5, 15)),
            (RelationTriple::new("A", "B", "C"), ItemId(2), SpanBoundary::new(5, 15)),
        ];

        let serialize = || {
            let mut kb = KnowledgeAggregator::new();
            for (triple, item, span) in insertions.iter().cloned() {
                kb.insert(triple, item, span);
            }
            GraphDocument::from_graph(kb.graph(), true).to_json().unwrap()
        };

        assert_eq!(serialize(), serialize());
    }

    #[test]
    fn test_greedy_preset_requests_one_sequence() {
        let store = seeded_store();
        let model = MockRelationModel::new([PARIS]);
        let extractor = RelationExtractor::new(model, ExtractorConfig::greedy());

        let corpus = merge_corpus(&store, &JobRequest::new(vec![ItemId(1)], vec![])).unwrap();
        let extraction = extractor.extract(&corpus, None).unwrap();
        assert_eq!(extraction.stats.sequences, 1);
        assert_eq!(extractor.config().num_return_sequences, 1);
    }
}
