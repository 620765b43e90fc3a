//! kbforge Domain Layer
//!
//! This crate contains the data model of the relation-extraction pipeline and
//! the trait interfaces every other layer depends upon. Apart from `uuid` (job
//! identifiers) it has no external dependencies.
//!
//! ## Key Concepts
//!
//! - **Content item**: an idea or knowledge source whose text is mined for relations
//! - **Collection**: an ordered group of content items (a group or a domain)
//! - **Relation triple**: a `(head, type, tail)` fact decoded from model output
//! - **Knowledge graph**: deduplicated triples with span provenance
//! - **Job**: one asynchronous extraction run with a `pending → ready | error` lifecycle
//!
//! ## Architecture
//!
//! - Pure data and lifecycle rules only
//! - Infrastructure (model, storage) lives in other crates behind the traits in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod content;
pub mod job;
pub mod relation;
pub mod traits;

// Re-exports for convenience
pub use content::{Collection, CollectionId, CollectionKind, ContentItem, ContentKind, ItemId};
pub use job::{Job, JobId, JobRequest, JobStatus, Privacy, TransitionError};
pub use relation::{KnowledgeGraph, RelationRecord, RelationTriple, SpanBoundary, SpanProvenance};
