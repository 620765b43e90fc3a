//! kbforge Extractor
//!
//! Turns content items into a deduplicated knowledge graph using a pretrained
//! sequence-to-sequence relation-extraction model.
//!
//! # Architecture
//!
//! ```text
//! JobRequest → merge_corpus → items
//!   item → tokenize → plan_spans → generate (per span) → parse_relations
//!        → KnowledgeAggregator → GraphDocument (JSON)
//! ```
//!
//! Every stage except the model is a pure function of its input. The parser
//! and aggregator never fail; only input resolution, the model, and the
//! deadline can abort a run.
//!
//! # Example Usage
//!
//! ```
//! use kbforge_domain::{ContentItem, ContentKind, ItemId};
//! use kbforge_extractor::{ExtractorConfig, RelationExtractor};
//! use kbforge_model::MockRelationModel;
//!
//! let model = MockRelationModel::new(["<triplet> Paris <subj> France <obj> capital of"]);
//! let extractor = RelationExtractor::new(model, ExtractorConfig::default());
//!
//! let item = ContentItem::new(
//!     ItemId(1),
//!     ContentKind::Idea,
//!     "Paris",
//!     "Paris is the capital of France.",
//!     "2024-01-01",
//! );
//! let extraction = extractor.extract(&[item], None).unwrap();
//! assert_eq!(extraction.graph.len(), 1);
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod corpus;
mod document;
mod error;
mod extractor;
mod knowledge;
mod parser;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::{plan_spans, SpanPlan};
pub use config::ExtractorConfig;
pub use corpus::merge_corpus;
pub use document::{GraphDocument, RelationEntry, RelationMeta};
pub use error::ExtractorError;
pub use extractor::RelationExtractor;
pub use knowledge::{InsertOutcome, KnowledgeAggregator};
pub use parser::parse_relations;
pub use types::{Extraction, ExtractionStats};
