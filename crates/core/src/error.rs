//! Error types for the Charloom domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context has
//! its own error enum; adapter (enrichment) failures deliberately have no
//! error type — they are absorbed at their call site and never propagate.

use thiserror::Error;

/// The top-level error type for all Charloom operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Turn validation ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Generation service ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Conversation-state storage ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A turn rejected before any side effect or external call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message is required (or regenerate with a prior user message in history)")]
    MissingMessage,

    #[error("character.name is required")]
    MissingCharacterName,

    #[error("character.description is required")]
    MissingCharacterDescription,
}

/// A failure of the external text-generation service.
///
/// The variants deliberately distinguish "request failed" from "invalid
/// response" from "no response" so the caller can decide whether a retry
/// is worth offering to the user.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("service returned {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("empty completion")]
    EmptyCompletion,
}

impl GenerationError {
    /// Coarse category used in user-visible error payloads.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidResponse(_) => "invalid response",
            Self::EmptyCompletion => "no response",
            _ => "request failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_the_field() {
        let err = Error::Validation(ValidationError::MissingCharacterName);
        assert!(err.to_string().contains("character.name"));
    }

    #[test]
    fn generation_error_categories_are_distinct() {
        assert_eq!(
            GenerationError::RequestFailed("connection refused".into()).category(),
            "request failed"
        );
        assert_eq!(
            GenerationError::InvalidResponse("missing choices".into()).category(),
            "invalid response"
        );
        assert_eq!(GenerationError::EmptyCompletion.category(), "no response");
        assert_eq!(
            GenerationError::ApiError {
                status_code: 500,
                message: "upstream".into()
            }
            .category(),
            "request failed"
        );
    }
}
