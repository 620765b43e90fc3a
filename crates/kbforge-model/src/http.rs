//! HTTP Model Implementation
//!
//! Talks to a generation server hosting a seq2seq relation-extraction model
//! (REBEL-style triplet markup). The server owns the tokenizer and the model
//! weights; this client only ships token ids and generation parameters.
//!
//! # Endpoints
//!
//! - `POST {endpoint}/tokenize` with `{"text": ...}` returns
//!   `{"input_ids": [...], "attention_mask": [...]}`
//! - `POST {endpoint}/generate` with the token window and generation
//!   parameters returns `{"sequences": [...]}`, decoded without skipping
//!   special tokens so the triplet markers survive
//!
//! Calls are blocking: extraction runs on a dedicated worker thread.

use crate::ModelError;
use kbforge_domain::traits::{GenerationRequest, RelationModel, TokenizedText};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default generation server endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8600";

/// Default timeout for one HTTP request (120 seconds; beam search is slow on CPU)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of attempts per call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for the generation server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Base URL of the generation server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per call before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ModelConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Request body for the tokenize endpoint
#[derive(Serialize)]
struct TokenizeRequest<'a> {
    text: &'a str,
}

/// Response from the tokenize endpoint
#[derive(Deserialize)]
struct TokenizeResponse {
    input_ids: Vec<u32>,
    attention_mask: Vec<u32>,
}

/// Request body for the generate endpoint
#[derive(Serialize)]
struct GenerateBody<'a> {
    input_ids: &'a [u32],
    attention_mask: &'a [u32],
    num_beams: u32,
    num_return_sequences: u32,
    max_length: u32,
    length_penalty: f32,
}

/// Response from the generate endpoint
#[derive(Deserialize)]
struct GenerateResponse {
    sequences: Vec<String>,
}

/// Relation model served over HTTP
pub struct HttpRelationModel {
    endpoint: String,
    client: reqwest::blocking::Client,
    max_retries: u32,
}

impl HttpRelationModel {
    /// Create a client for the given configuration
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kbforge_model::{HttpRelationModel, ModelConfig};
    ///
    /// let model = HttpRelationModel::new(&ModelConfig::default()).unwrap();
    /// ```
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        config.validate().map_err(ModelError::Other)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::Communication(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
            max_retries: config.max_retries,
        })
    }

    /// Endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST a JSON body, retrying transient failures with exponential backoff
    fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ModelError>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, path);

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(body).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<R>().map_err(|e| {
                            ModelError::InvalidResponse(format!("Failed to parse response: {}", e))
                        });
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ModelError::ModelNotAvailable(url));
                    } else {
                        let error_text = response
                            .text()
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(ModelError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(ModelError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!("{} failed (attempt {}), retrying in {:?}", url, attempts, delay);
                std::thread::sleep(delay);
            }
        }

        Err(last_error
            .unwrap_or_else(|| ModelError::Communication("Max retries exceeded".to_string())))
    }
}

impl RelationModel for HttpRelationModel {
    type Error = ModelError;

    fn tokenize(&self, text: &str) -> Result<TokenizedText, Self::Error> {
        let response: TokenizeResponse = self.post("tokenize", &TokenizeRequest { text })?;

        if response.input_ids.len() != response.attention_mask.len() {
            return Err(ModelError::InvalidResponse(format!(
                "attention mask has {} entries for {} tokens",
                response.attention_mask.len(),
                response.input_ids.len()
            )));
        }

        debug!("Tokenized {} chars into {} tokens", text.len(), response.input_ids.len());

        Ok(TokenizedText {
            input_ids: response.input_ids,
            attention_mask: response.attention_mask,
        })
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<String>, Self::Error> {
        let body = GenerateBody {
            input_ids: request.input_ids,
            attention_mask: request.attention_mask,
            num_beams: request.num_beams,
            num_return_sequences: request.num_return_sequences,
            max_length: request.max_length,
            length_penalty: request.length_penalty,
        };

        let response: GenerateResponse = self.post("generate", &body)?;
        Ok(response.sequences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_model_creation() {
        let config = ModelConfig {
            endpoint: "http://localhost:8600/".to_string(),
            ..Default::default()
        };
        let model = HttpRelationModel::new(&config).unwrap();
        assert_eq!(model.endpoint(), "http://localhost:8600");
        assert_eq!(model.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ModelConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(HttpRelationModel::new(&config).is_err());
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: ModelConfig = serde_json::from_str(r#"{"endpoint": "http://gpu-box:9000"}"#).unwrap();
        assert_eq!(config.endpoint, "http://gpu-box:9000");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_generate_body_shape() {
        let body = GenerateBody {
            input_ids: &[5, 6],
            attention_mask: &[1, 1],
            num_beams: 3,
            num_return_sequences: 3,
            max_length: 256,
            length_penalty: 0.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["input_ids"], serde_json::json!([5, 6]));
        assert_eq!(json["num_return_sequences"], 3);
    }

    #[test]
    fn test_unreachable_server() {
        // Port 9 (discard) is not an HTTP server
        let config = ModelConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            max_retries: 1,
        };
        let model = HttpRelationModel::new(&config).unwrap();

        match model.tokenize("text") {
            Err(ModelError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other.map(|t| t.len())),
        }
    }
}
