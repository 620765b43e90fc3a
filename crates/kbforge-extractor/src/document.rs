//! JSON artifact for a knowledge graph
//!
//! The stored document has the shape
//!
//! ```json
//! { "relations": [
//!     { "head": "Paris", "type": "capital of", "tail": "France",
//!       "meta": { "spans": [[0, 128], [72, 200]] } } ] }
//! ```
//!
//! With item ids enabled, `meta` also carries `"items"`, parallel to `"spans"`.

use crate::error::ExtractorError;
use kbforge_domain::KnowledgeGraph;
use serde::{Deserialize, Serialize};

/// Provenance block of one relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMeta {
    /// `[start, end]` token offsets, one per provenance entry
    pub spans: Vec<[usize; 2]>,

    /// Item id of each span entry, when recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<i64>>,
}

/// One relation of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEntry {
    /// Subject text
    pub head: String,

    /// Relation type text
    #[serde(rename = "type")]
    pub relation: String,

    /// Object text
    pub tail: String,

    /// Provenance
    pub meta: RelationMeta,
}

/// Serialized knowledge graph as stored on a ready job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Relations in first-seen order
    pub relations: Vec<RelationEntry>,
}

impl GraphDocument {
    /// Build the document for a graph
    pub fn from_graph(graph: &KnowledgeGraph, include_item_ids: bool) -> Self {
        let relations = graph
            .records
            .iter()
            .map(|record| RelationEntry {
                head: record.triple.head.clone(),
                relation: record.triple.relation.clone(),
                tail: record.triple.tail.clone(),
                meta: RelationMeta {
                    spans: record
                        .spans
                        .iter()
                        .map(|p| [p.span.start, p.span.end])
                        .collect(),
                    items: include_item_ids
                        .then(|| record.spans.iter().map(|p| p.item_id.0).collect()),
                },
            })
            .collect();

        Self { relations }
    }

    /// Compact JSON encoding
    pub fn to_json(&self) -> Result<String, ExtractorError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored document
    pub fn from_json(json: &str) -> Result<Self, ExtractorError> {
        serde_json::from_str(json).map_err(|e| ExtractorError::Parse(e.to_string()))
    }

    /// Number of relations
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// True if the document holds no relations
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KnowledgeAggregator;
    use kbforge_domain::{ItemId, RelationTriple, SpanBoundary};

    fn sample_graph() -> KnowledgeGraph {
        let mut kb = KnowledgeAggregator::new();
        let triple = RelationTriple::new("Paris", "capital of", "France");
        kb.insert(triple.clone(), ItemId(1), SpanBoundary::new(0, 128));
        kb.insert(triple, ItemId(2), SpanBoundary::new(0, 128));
        kb.into_graph()
    }

    #[test]
    fn test_legacy_shape() {
        let json = GraphDocument::from_graph(&sample_graph(), false).to_json().unwrap();
        assert_eq!(
            json,
            r#"{"relations":[{"head":"Paris","type":"capital of","tail":"France","meta":{"spans":[[0,128],[0,128]]}}]}"#
        );
    }

    #[test]
    fn test_item_ids_parallel_to_spans() {
        let doc = GraphDocument::from_graph(&sample_graph(), true);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["relations"][0]["meta"]["items"], serde_json::json!([1, 2]));
        assert_eq!(
            value["relations"][0]["meta"]["spans"],
            serde_json::json!([[0, 128], [0, 128]])
        );
    }

    #[test]
    fn test_empty_graph() {
        let json = GraphDocument::from_graph(&KnowledgeGraph::default(), false)
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"relations":[]}"#);
    }

    #[test]
    fn test_parse_stored_document() {
        let doc = GraphDocument::from_json(
            r#"{"relations":[{"head":"A","type":"B","tail":"C","meta":{"spans":[[5,15]]}}]}"#,
        )
        .unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.relations[0].relation, "B");
        assert_eq!(doc.relations[0].meta.spans, vec![[5, 15]]);
        assert!(doc.relations[0].meta.items.is_none());
    }

    #[test]
    fn test_parse_invalid_document() {
        assert!(matches!(
            GraphDocument::from_json("not json"),
            Err(ExtractorError::Parse(_))
        ));
    }
}
