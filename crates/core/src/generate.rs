//! Generator trait — the abstraction over the text-generation service.
//!
//! A Generator accepts an ordered list of role-tagged segments plus sampling
//! parameters and returns one completion string. Every call is attempted
//! exactly once per turn; retrying is the caller's decision.

use crate::error::GenerationError;
use crate::segment::PromptSegment;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Parameters for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The composed prompt, in contract order.
    pub segments: Vec<PromptSegment>,

    /// Maximum completion length in tokens.
    pub max_tokens: u32,

    /// Sampling temperature — high for creative variance.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.9
}

/// The text-generation capability.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this backend (e.g. "openai").
    fn name(&self) -> &str;

    /// Send the composed prompt, get one completion back.
    ///
    /// An empty or whitespace-only completion is an error
    /// ([`GenerationError::EmptyCompletion`]), never an empty `Ok`.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_high_temperature() {
        let json = r#"{"segments": [], "max_tokens": 300}"#;
        let request: GenerationRequest = serde_json::from_str(json).unwrap();
        assert!((request.temperature - 0.9).abs() < f32::EPSILON);
    }
}
