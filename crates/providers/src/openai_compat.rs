//! OpenAI-compatible generation backend.
//!
//! Works with OpenAI and any endpoint exposing a compatible
//! `/v1/chat/completions` route (OpenRouter, Ollama, vLLM, Together AI).
//! Non-streaming only: one composed prompt in, one completion out.

use async_trait::async_trait;
use charloom_config::AppConfig;
use charloom_core::error::GenerationError;
use charloom_core::generate::{GenerationRequest, Generator};
use charloom_core::segment::PromptSegment;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible generation service client.
pub struct OpenAiGenerator {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// Build the generator from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.generation.base_url.clone(),
            config.api_key.clone().unwrap_or_default(),
            config.generation.model.clone(),
            std::time::Duration::from_secs(config.generation.timeout_secs),
        )
    }

    /// Convert composed segments to the wire message format.
    fn to_api_messages(segments: &[PromptSegment]) -> Vec<ApiMessage> {
        segments
            .iter()
            .map(|segment| ApiMessage {
                role: segment.role.as_str().to_string(),
                content: segment.content.clone(),
            })
            .collect()
    }

    /// Pull the completion text out of a parsed response body.
    fn parse_completion(response: ApiResponse) -> Result<String, GenerationError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse("no choices in response".into()))?;

        let content = choice.message.content.unwrap_or_default();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(&request.segments),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false,
        });

        debug!(
            model = %self.model,
            segments = request.segments.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(GenerationError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(GenerationError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Generation service returned error");
            return Err(GenerationError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("failed to parse response: {e}")))?;

        Self::parse_completion(api_response)
    }
}

// --- Wire types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OpenAiGenerator {
        OpenAiGenerator::new(
            "https://api.openai.com/v1/",
            "sk-test",
            "gpt-4o-mini",
            std::time::Duration::from_secs(5),
        )
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(generator().base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn segments_convert_to_wire_roles() {
        let segments = vec![
            PromptSegment::system("rules"),
            PromptSegment::user("Hello"),
            PromptSegment::assistant("*waves*"),
        ];
        let messages = OpenAiGenerator::to_api_messages(&segments);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[2].content, "*waves*");
    }

    #[test]
    fn completion_is_extracted_and_trimmed() {
        let body = r#"{"choices":[{"message":{"content":"  Hello there.  "}}]}"#;
        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            OpenAiGenerator::parse_completion(response).unwrap(),
            "Hello there."
        );
    }

    #[test]
    fn missing_choices_is_invalid_response() {
        let body = r#"{"choices":[]}"#;
        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            OpenAiGenerator::parse_completion(response),
            Err(GenerationError::InvalidResponse(_))
        ));
    }

    #[test]
    fn blank_completion_is_empty_completion() {
        let body = r#"{"choices":[{"message":{"content":"   \n"}}]}"#;
        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            OpenAiGenerator::parse_completion(response),
            Err(GenerationError::EmptyCompletion)
        ));

        let body = r#"{"choices":[{"message":{}}]}"#;
        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            OpenAiGenerator::parse_completion(response),
            Err(GenerationError::EmptyCompletion)
        ));
    }
}
