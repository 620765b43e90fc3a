//! Configuration for the Extractor

use kbforge_domain::traits::GenerationRequest;
use serde::{Deserialize, Serialize};

/// Configuration for the extraction pipeline
///
/// Generation parameters are passed verbatim to the model capability for
/// every span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Width of one span window (tokens)
    pub span_length: usize,

    /// Beam width
    pub num_beams: u32,

    /// Decoded sequences requested per span
    pub num_return_sequences: u32,

    /// Maximum length of each generated sequence
    pub max_length: u32,

    /// Length penalty applied during beam search
    pub length_penalty: f32,

    /// Emit per-span item ids in the stored artifact
    pub include_item_ids: bool,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.span_length == 0 {
            return Err("span_length must be greater than 0".to_string());
        }
        if self.num_beams == 0 {
            return Err("num_beams must be greater than 0".to_string());
        }
        if self.num_return_sequences == 0 {
            return Err("num_return_sequences must be greater than 0".to_string());
        }
        if self.num_return_sequences > self.num_beams {
            return Err(format!(
                "num_return_sequences ({}) cannot exceed num_beams ({})",
                self.num_return_sequences, self.num_beams
            ));
        }
        if self.max_length == 0 {
            return Err("max_length must be greater than 0".to_string());
        }
        if !self.length_penalty.is_finite() {
            return Err("length_penalty must be a finite number".to_string());
        }
        Ok(())
    }

    /// Build the generation call for one span
    pub fn generation_request<'a>(
        &self,
        input_ids: &'a [u32],
        attention_mask: &'a [u32],
    ) -> GenerationRequest<'a> {
        GenerationRequest {
            input_ids,
            attention_mask,
            num_beams: self.num_beams,
            num_return_sequences: self.num_return_sequences,
            max_length: self.max_length,
            length_penalty: self.length_penalty,
        }
    }
}

impl Default for ExtractorConfig {
    /// Beam search settings of the pretrained REBEL checkpoint
    fn default() -> Self {
        Self {
            span_length: 128,
            num_beams: 3,
            num_return_sequences: 3,
            max_length: 256,
            length_penalty: 0.0,
            include_item_ids: false,
        }
    }
}

impl ExtractorConfig {
    /// Greedy preset: one beam, one sequence per span (roughly 3x fewer decodings)
    pub fn greedy() -> Self {
        Self {
            num_beams: 1,
            num_return_sequences: 1,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
