//! Turn request — the pipeline's unit of work.
//!
//! The caller supplies the rolling history with every request; the pipeline
//! does not persist history itself (that is the session layer's job) and only
//! consumes a budget-bounded suffix of it.

use crate::character::Character;
use crate::store::ConversationKey;
use serde::{Deserialize, Serialize};

/// One prior exchange line, as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub text: String,
    pub is_user: bool,
}

impl HistoryEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
        }
    }
}

/// A single user-message-in, assistant-reply-out unit of work.
///
/// Doubles as the `/chat` request body (camelCase wire format).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// The user's message. May be stale when `regenerate` is set — the
    /// effective message is then re-derived from history.
    #[serde(default)]
    pub message: String,

    pub character: Character,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    /// Groups all turns of one ongoing chat. Falls back to a default bucket
    /// when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_key: Option<String>,

    /// User-authored persistent context, distinct from rolling history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_memory: Option<String>,

    /// Ask for a fresh completion of the same prompt without resending the
    /// original message.
    #[serde(default)]
    pub regenerate: bool,
}

impl TurnRequest {
    /// Resolve the message this turn is actually about.
    ///
    /// With `regenerate` set, the most recent user entry in history wins
    /// regardless of the `message` field. Returns `None` when no non-blank
    /// message can be derived — such a turn must be rejected before any
    /// external call.
    pub fn effective_message(&self) -> Option<&str> {
        if self.regenerate {
            return self
                .history
                .iter()
                .rev()
                .find(|entry| entry.is_user && !entry.text.trim().is_empty())
                .map(|entry| entry.text.as_str());
        }
        let trimmed = self.message.trim();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    }

    /// The conversation key, falling back to the default bucket.
    pub fn conversation_key(&self) -> ConversationKey {
        match self.conversation_key.as_deref() {
            Some(key) if !key.trim().is_empty() => ConversationKey::from(key),
            _ => ConversationKey::default_bucket(),
        }
    }
}
