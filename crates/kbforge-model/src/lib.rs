//! kbforge Model Layer
//!
//! Implementations of the [`RelationModel`] capability from `kbforge-domain`.
//!
//! # Models
//!
//! - `MockRelationModel`: Deterministic scripted decodings for testing
//! - `HttpRelationModel`: Blocking client for a seq2seq generation server
//!
//! # Examples
//!
//! ```
//! use kbforge_model::MockRelationModel;
//! use kbforge_domain::traits::{GenerationRequest, RelationModel};
//!
//! let model = MockRelationModel::new(["<triplet> Paris <subj> France <obj> capital of"]);
//! let tokens = model.tokenize("Paris is the capital of France").unwrap();
//! let request = GenerationRequest {
//!     input_ids: &tokens.input_ids,
//!     attention_mask: &tokens.attention_mask,
//!     num_beams: 3,
//!     num_return_sequences: 1,
//!     max_length: 256,
//!     length_penalty: 0.0,
//! };
//! assert_eq!(model.generate(&request).unwrap().len(), 1);
//! ```

#![warn(missing_docs)]

pub mod http;

use kbforge_domain::traits::{GenerationRequest, RelationModel, TokenizedText};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use http::{HttpRelationModel, ModelConfig};

/// Errors that can occur during model operations
#[derive(Error, Debug)]
pub enum ModelError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the generation server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("Model error: {0}")]
    Other(String),
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ModelError> {
    mutex
        .lock()
        .map_err(|e| ModelError::Other(format!("Mock state poisoned: {}", e)))
}

/// Interning whitespace vocabulary shared by clones of one mock
#[derive(Debug, Default)]
struct Vocabulary {
    ids: HashMap<String, u32>,
    words: Vec<String>,
}

impl Vocabulary {
    fn intern(&mut self, word: &str) -> u32 {
        if let Some(id) = self.ids.get(word) {
            return *id;
        }
        let id = self.words.len() as u32;
        self.words.push(word.to_string());
        self.ids.insert(word.to_string(), id);
        id
    }

    fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .filter_map(|id| self.words.get(*id as usize))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Mock relation model for deterministic testing
///
/// Tokenizes on whitespace (one id per word) and answers `generate` calls with
/// scripted decodings. A response is chosen by the first registered trigger
/// that occurs in the decoded span text; otherwise the default decodings are
/// returned. No network calls are made.
///
/// # Examples
///
/// ```
/// use kbforge_model::MockRelationModel;
/// use kbforge_domain::traits::{GenerationRequest, RelationModel};
///
/// let mut model = MockRelationModel::new(Vec::<String>::new());
/// model.add_response("Paris", ["<triplet> Paris <subj> France <obj> capital of"]);
/// model.add_error("Atlantis");
///
/// let tokens = model.tokenize("Atlantis sank").unwrap();
/// let request = GenerationRequest {
///     input_ids: &tokens.input_ids,
///     attention_mask: &tokens.attention_mask,
///     num_beams: 1,
///     num_return_sequences: 1,
///     max_length: 64,
///     length_penalty: 0.0,
/// };
/// assert!(model.generate(&request).is_err());
/// assert_eq!(model.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockRelationModel {
    default_decodings: Vec<String>,
    responses: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    errors: Arc<Mutex<Vec<String>>>,
    fail_after: Option<usize>,
    latency: Option<Duration>,
    vocabulary: Arc<Mutex<Vocabulary>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockRelationModel {
    /// Create a mock returning the same decodings for every span
    pub fn new<I, S>(decodings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default_decodings: decodings.into_iter().map(Into::into).collect(),
            responses: Arc::new(Mutex::new(Vec::new())),
            errors: Arc::new(Mutex::new(Vec::new())),
            fail_after: None,
            latency: None,
            vocabulary: Arc::new(Mutex::new(Vocabulary::default())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Return `decodings` for spans whose text contains `trigger`
    pub fn add_response<I, S>(&mut self, trigger: impl Into<String>, decodings: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((trigger.into(), decodings.into_iter().map(Into::into).collect()));
        }
    }

    /// Fail generation for spans whose text contains `trigger`
    pub fn add_error(&mut self, trigger: impl Into<String>) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(trigger.into());
        }
    }

    /// Fail every generation call after the first `calls` succeed
    pub fn fail_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    /// Sleep for `latency` inside every generation call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.lock().map(|count| *count).unwrap_or(0)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        if let Ok(mut count) = self.call_count.lock() {
            *count = 0;
        }
    }
}

impl Default for MockRelationModel {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl RelationModel for MockRelationModel {
    type Error = ModelError;

    fn tokenize(&self, text: &str) -> Result<TokenizedText, Self::Error> {
        let mut vocabulary = lock(&self.vocabulary)?;
        let input_ids: Vec<u32> = text.split_whitespace().map(|w| vocabulary.intern(w)).collect();
        let attention_mask = vec![1; input_ids.len()];
        Ok(TokenizedText {
            input_ids,
            attention_mask,
        })
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<String>, Self::Error> {
        let calls = {
            let mut count = lock(&self.call_count)?;
            *count += 1;
            *count
        };

        if let Some(limit) = self.fail_after {
            if calls > limit {
                return Err(ModelError::Other(format!("Mock failure on call {}", calls)));
            }
        }

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        let text = lock(&self.vocabulary)?.decode(request.input_ids);

        if lock(&self.errors)?.iter().any(|trigger| text.contains(trigger.as_str())) {
            return Err(ModelError::Other("Mock error".to_string()));
        }

        let responses = lock(&self.responses)?;
        let decodings = responses
            .iter()
            .find(|(trigger, _)| text.contains(trigger.as_str()))
            .map(|(_, decodings)| decodings.clone())
            .unwrap_or_else(|| self.default_decodings.clone());

        Ok(decodings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(model: &MockRelationModel, text: &str) -> Result<Vec<String>, ModelError> {
        let tokens = model.tokenize(text)?;
        model.generate(&GenerationRequest {
            input_ids: &tokens.input_ids,
            attention_mask: &tokens.attention_mask,
            num_beams: 3,
            num_return_sequences: 3,
            max_length: 256,
            length_penalty: 0.0,
        })
    }

    #[test]
    fn test_mock_tokenizer_interns_words() {
        let model = MockRelationModel::default();
        let tokens = model.tokenize("a b a  c").unwrap();
        assert_eq!(tokens.input_ids, vec![0, 1, 0, 2]);
        assert_eq!(tokens.attention_mask, vec![1, 1, 1, 1]);
        assert!(model.tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_mock_default_response() {
        let model = MockRelationModel::new(["x", "y"]);
        assert_eq!(generate(&model, "anything").unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_mock_triggered_responses() {
        let mut model = MockRelationModel::new(["default"]);
        model.add_response("Paris", ["paris decoding"]);
        model.add_response("Rome", ["rome decoding"]);

        assert_eq!(generate(&model, "Paris is big").unwrap(), vec!["paris decoding"]);
        assert_eq!(generate(&model, "Rome too").unwrap(), vec!["rome decoding"]);
        assert_eq!(generate(&model, "Berlin").unwrap(), vec!["default"]);
    }

    #[test]
    fn test_mock_error_trigger() {
        let mut model = MockRelationModel::default();
        model.add_error("bad");
        assert!(matches!(generate(&model, "a bad span"), Err(ModelError::Other(_))));
        assert!(generate(&model, "a good span").is_ok());
    }

    #[test]
    fn test_mock_fail_after() {
        let model = MockRelationModel::new(["ok"]).fail_after(2);
        assert!(generate(&model, "one").is_ok());
        assert!(generate(&model, "two").is_ok());
        assert!(generate(&model, "three").is_err());
        assert_eq!(model.call_count(), 3);
    }

    #[test]
    fn test_mock_clone_shares_state() {
        let model1 = MockRelationModel::new(["ok"]);
        let model2 = model1.clone();

        generate(&model1, "text").unwrap();

        assert_eq!(model1.call_count(), 1);
        assert_eq!(model2.call_count(), 1);

        model2.reset_call_count();
        assert_eq!(model1.call_count(), 0);
    }
}
