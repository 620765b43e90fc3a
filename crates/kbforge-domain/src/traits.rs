//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! collaborators. Infrastructure implementations live in other crates.

use crate::{Collection, CollectionId, ContentItem, ItemId, Job, JobId};

/// Token ids and attention mask for one text, as produced by the model's tokenizer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedText {
    /// Token ids
    pub input_ids: Vec<u32>,

    /// Attention mask, same length as `input_ids`
    pub attention_mask: Vec<u32>,
}

impl TokenizedText {
    /// Number of tokens
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// True if the text produced no tokens
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// One generation call: a token window plus decoding parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest<'a> {
    /// Token ids of the span
    pub input_ids: &'a [u32],

    /// Attention mask of the span
    pub attention_mask: &'a [u32],

    /// Beam width
    pub num_beams: u32,

    /// Decoded sequences to return
    pub num_return_sequences: u32,

    /// Maximum length of each generated sequence
    pub max_length: u32,

    /// Length penalty applied during beam search
    pub length_penalty: f32,
}

/// Trait for the pretrained relation-extraction model
///
/// Implemented by the infrastructure layer (kbforge-model). The model is an
/// opaque capability: it tokenizes text and turns token windows into decoded
/// strings in the triplet markup grammar. Implementations are loaded once per
/// worker and never mutated by the pipeline.
pub trait RelationModel {
    /// Error type for model operations
    type Error;

    /// Tokenize a whole text
    fn tokenize(&self, text: &str) -> Result<TokenizedText, Self::Error>;

    /// Generate `num_return_sequences` decoded strings for one token window
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<String>, Self::Error>;
}

/// Read-only lookup of content items and collections
///
/// Implemented by the infrastructure layer (kbforge-store)
pub trait ContentStore {
    /// Error type for store operations
    type Error;

    /// Get an item by id
    fn get_item(&self, id: ItemId) -> Result<Option<ContentItem>, Self::Error>;

    /// Get a collection by id
    fn get_collection(&self, id: CollectionId) -> Result<Option<Collection>, Self::Error>;
}

/// Persistence of job records
///
/// Implemented by the infrastructure layer (kbforge-store)
pub trait JobStore {
    /// Error type for store operations
    type Error;

    /// Persist a new job
    fn create_job(&mut self, job: &Job) -> Result<JobId, Self::Error>;

    /// Get a job by id
    fn get_job(&self, id: JobId) -> Result<Option<Job>, Self::Error>;

    /// Most recently created job, if any
    fn latest_job(&self) -> Result<Option<Job>, Self::Error>;

    /// Persist a lifecycle transition
    ///
    /// Must refuse to overwrite a job whose stored status is already terminal.
    fn update_job(&mut self, job: &Job) -> Result<(), Self::Error>;

    /// Ids of all pending jobs, oldest first
    fn pending_jobs(&self) -> Result<Vec<JobId>, Self::Error>;
}
