//! Knowledge aggregation: triple deduplication with span provenance

use kbforge_domain::{
    ItemId, KnowledgeGraph, RelationRecord, RelationTriple, SpanBoundary, SpanProvenance,
};
use std::collections::HashMap;

/// What an insertion did to the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The triple was new; a record was appended
    NewRecord,
    /// The triple existed; the provenance entry was added to it
    NewProvenance,
    /// The triple and provenance entry were both already present
    Duplicate,
}

/// Accumulates triples from many decodings into one deduplicated graph
///
/// Records keep the order in which their triple was first inserted, so the
/// graph is deterministic for a fixed insertion order. Triples are compared
/// literally (see [`RelationTriple`]).
///
/// # Examples
///
/// ```
/// use kbforge_domain::{ItemId, RelationTriple, SpanBoundary};
/// use kbforge_extractor::KnowledgeAggregator;
///
/// let mut kb = KnowledgeAggregator::new();
/// let triple = RelationTriple::new("Paris", "capital of", "France");
/// kb.insert(triple.clone(), ItemId(1), SpanBoundary::new(0, 10));
/// kb.insert(triple, ItemId(2), SpanBoundary::new(5, 15));
///
/// assert_eq!(kb.graph().len(), 1);
/// assert_eq!(kb.graph().records[0].spans.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct KnowledgeAggregator {
    graph: KnowledgeGraph,
    index: HashMap<RelationTriple, usize>,
    inserts: usize,
}

impl KnowledgeAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `triple` was extracted from `span` of `item_id`
    pub fn insert(
        &mut self,
        triple: RelationTriple,
        item_id: ItemId,
        span: SpanBoundary,
    ) -> InsertOutcome {
        let ordinal = self.inserts;
        self.inserts += 1;
        let provenance = SpanProvenance::new(item_id, span);

        if let Some(&position) = self.index.get(&triple) {
            return match self.graph.records.get_mut(position) {
                Some(record) => {
                    if record.add_provenance(provenance) {
                        InsertOutcome::NewProvenance
                    } else {
                        InsertOutcome::Duplicate
                    }
                }
                None => InsertOutcome::Duplicate,
            };
        }

        self.index.insert(triple.clone(), self.graph.records.len());
        self.graph
            .records
            .push(RelationRecord::new(triple, provenance, ordinal));
        InsertOutcome::NewRecord
    }

    /// The graph built so far
    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    /// Consume the aggregator, returning its graph
    pub fn into_graph(self) -> KnowledgeGraph {
        self.graph
    }

    /// Number of `insert` calls so far
    pub fn insert_count(&self) -> usize {
        self.inserts
    }
}
