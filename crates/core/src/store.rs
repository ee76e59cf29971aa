//! Conversation-state storage abstraction.
//!
//! The store is the only long-lived shared mutable resource in the pipeline.
//! State is read-then-written within one logical turn; the pipeline assumes
//! at most one in-flight turn per conversation key — callers must serialize
//! turns per conversation.

use crate::error::StoreError;
use crate::state::ConversationState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifier grouping all turns belonging to one ongoing chat
/// (per user+character pair in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey(pub String);

impl ConversationKey {
    pub fn from(key: &str) -> Self {
        Self(key.to_string())
    }

    /// The bucket used when a request carries no key.
    pub fn default_bucket() -> Self {
        Self("default".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage backend for per-conversation state.
///
/// Backed by an in-memory map by default; a production deployment may back
/// it with a durable key-value table of `key -> ConversationState` blobs.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// A human-readable name for this backend (e.g. "in_memory").
    fn name(&self) -> &str;

    /// Load the state for a key, creating a default-initialized state on
    /// first access.
    async fn load(&self, key: &ConversationKey) -> Result<ConversationState, StoreError>;

    /// Persist the state for a key.
    async fn save(
        &self,
        key: &ConversationKey,
        state: ConversationState,
    ) -> Result<(), StoreError>;

    /// Number of tracked conversations.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Drop all tracked conversations.
    async fn clear(&self) -> Result<(), StoreError>;
}
