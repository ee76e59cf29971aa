//! Character profile — the persona a conversation is held with.
//!
//! Characters are owned by their creator and are read-only input to the
//! pipeline: a profile never changes during a single turn. Optional fields
//! that are absent or blank contribute nothing to the composed prompt.

use serde::{Deserialize, Serialize};

/// A character persona supplied with every turn request.
///
/// Wire format is camelCase to match the client contract
/// (e.g. `firstMessage`, `isPublic`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Stable identifier assigned by the character store (optional here —
    /// the pipeline never dereferences it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name. Required for a valid turn.
    pub name: String,

    /// Short description. Required for a valid turn.
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backstory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivations: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,

    /// Creator-supplied scenario. When absent the composer synthesizes one
    /// from keyword templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,

    /// The character's opening line, used as the bootstrap exemplar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,

    /// Tone switch: bold/expressive when set, friendly otherwise.
    #[serde(default)]
    pub nsfw: bool,

    #[serde(default)]
    pub is_public: bool,
}

impl Character {
    /// Minimal character with only the required fields set.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            backstory: None,
            personality: None,
            motivations: None,
            values: None,
            accent: None,
            scenario: None,
            first_message: None,
            nsfw: false,
            is_public: false,
        }
    }

    /// A field counts as present only if it contains non-whitespace text.
    pub fn field_present(field: &Option<String>) -> bool {
        field.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}
