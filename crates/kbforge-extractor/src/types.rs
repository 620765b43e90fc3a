//! Result types for extraction

use kbforge_domain::KnowledgeGraph;

/// Counters for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Items processed
    pub items: usize,

    /// Span windows planned across all items
    pub spans: usize,

    /// Calls to the model's generate capability
    pub model_calls: usize,

    /// Decoded sequences parsed
    pub sequences: usize,

    /// Triples parsed before deduplication
    pub triples_parsed: usize,

    /// Distinct relations in the resulting graph
    pub relations: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Outcome of extracting from a corpus
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Deduplicated relations with provenance
    pub graph: KnowledgeGraph,

    /// Run counters
    pub stats: ExtractionStats,
}
