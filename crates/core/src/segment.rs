//! Prompt segments — the unit the composer emits to the generation service.
//!
//! A segment is one role-tagged block of text. Ordering of segments is a hard
//! contract: the generation service sees exactly the sequence the composer
//! built, with empty segments never emitted.

use serde::{Deserialize, Serialize};

/// The role tag attached to a prompt segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentRole {
    /// Instructions: persona, memory, enrichment, behavioral rules
    System,
    /// The end user (history turns and the current message)
    User,
    /// The character (history turns and the bootstrap exemplar)
    Assistant,
}

impl SegmentRole {
    /// The wire name used by OpenAI-compatible chat APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged block of text sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSegment {
    pub role: SegmentRole,
    pub content: String,
}

impl PromptSegment {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: SegmentRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: SegmentRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: SegmentRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let seg = PromptSegment::system("rules");
        let json = serde_json::to_string(&seg).unwrap();
        assert!(json.contains(r#""role":"system""#));
    }

    #[test]
    fn constructors_set_roles() {
        assert_eq!(PromptSegment::user("hi").role, SegmentRole::User);
        assert_eq!(PromptSegment::assistant("hello").role, SegmentRole::Assistant);
        assert_eq!(SegmentRole::Assistant.as_str(), "assistant");
    }
}
