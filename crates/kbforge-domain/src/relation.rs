//! Relation module - triples, span provenance and the knowledge graph

use crate::ItemId;
use std::fmt;
use std::ops::Range;

/// Token-offset window `[start, end)` into one item's token sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpanBoundary {
    /// First token offset (inclusive)
    pub start: usize,

    /// Last token offset (exclusive)
    pub end: usize,
}

impl SpanBoundary {
    /// Create a new boundary
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Width of the window
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for a zero-width window
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slice range clipped to a sequence of `total` tokens
    ///
    /// The last boundary of a plan may extend past the end of the sequence.
    pub fn clip(&self, total: usize) -> Range<usize> {
        let end = self.end.min(total);
        self.start.min(end)..end
    }
}

impl fmt::Display for SpanBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A `(head, type, tail)` fact
///
/// Identity is exact equality of the whitespace-trimmed fields; no casing or
/// punctuation normalization is applied, so `Paris` and `paris` differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationTriple {
    /// Subject text
    pub head: String,

    /// Relation type text
    pub relation: String,

    /// Object text
    pub tail: String,
}

impl RelationTriple {
    /// Create a triple, trimming surrounding whitespace from every field
    pub fn new(head: impl AsRef<str>, relation: impl AsRef<str>, tail: impl AsRef<str>) -> Self {
        Self {
            head: head.as_ref().trim().to_string(),
            relation: relation.as_ref().trim().to_string(),
            tail: tail.as_ref().trim().to_string(),
        }
    }

    /// True when all three fields are non-empty
    pub fn is_complete(&self) -> bool {
        !self.head.is_empty() && !self.relation.is_empty() && !self.tail.is_empty()
    }
}

impl fmt::Display for RelationTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.head, self.relation, self.tail)
    }
}

/// Where a triple was seen: one span of one content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanProvenance {
    /// Content item the span belongs to
    pub item_id: ItemId,

    /// Token window within that item
    pub span: SpanBoundary,
}

impl SpanProvenance {
    /// Create a provenance entry
    pub fn new(item_id: ItemId, span: SpanBoundary) -> Self {
        Self { item_id, span }
    }
}

/// A deduplicated triple together with every span it was extracted from
#[derive(Debug, Clone, PartialEq)]
pub struct RelationRecord {
    /// The relation itself
    pub triple: RelationTriple,

    /// Provenance in insertion order, without duplicates
    pub spans: Vec<SpanProvenance>,

    /// Ordinal of the insertion that first produced this triple
    pub first_seen_index: usize,
}

impl RelationRecord {
    /// Create a record with a single provenance entry
    pub fn new(triple: RelationTriple, provenance: SpanProvenance, first_seen_index: usize) -> Self {
        Self {
            triple,
            spans: vec![provenance],
            first_seen_index,
        }
    }

    /// Append provenance unless already present
    ///
    /// Returns `true` if the entry was added.
    pub fn add_provenance(&mut self, provenance: SpanProvenance) -> bool {
        if self.spans.contains(&provenance) {
            return false;
        }
        self.spans.push(provenance);
        true
    }
}

/// The deduplicated relation set produced by one job
///
/// Records are kept in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeGraph {
    /// Relation records in first-seen order
    pub records: Vec<RelationRecord>,
}

impl KnowledgeGraph {
    /// Number of distinct relations
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no relation was extracted
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up the record for a triple
    pub fn find(&self, triple: &RelationTriple) -> Option<&RelationRecord> {
        self.records.iter().find(|r| &r.triple == triple)
    }

    /// Total provenance entries across all records
    pub fn provenance_count(&self) -> usize {
        self.records.iter().map(|r| r.spans.len()).sum()
    }
}
