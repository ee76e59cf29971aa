//! Per-conversation mutable state: emotion history, preferences, feedback log.
//!
//! This is the only mutable entity the pipeline owns. It is created lazily on
//! first access, mutated only by the feedback-extraction step of each turn,
//! and read by the prompt composer. All collections are capped so a long-lived
//! conversation cannot grow without bound.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most-recent emotion labels kept per conversation.
pub const EMOTION_HISTORY_CAP: usize = 10;
/// Most-recent feedback events kept per conversation.
pub const FEEDBACK_LOG_CAP: usize = 15;
/// Accumulated custom instructions kept per conversation.
pub const CUSTOM_INSTRUCTION_CAP: usize = 20;

/// A discrete action detected by the feedback extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackAction {
    Positive,
    Negative,
    StyleRequest,
    MoodRequest,
    FocusRequest,
    AvoidRequest,
    LessOfRequest,
    MoreOfRequest,
    CustomInstruction,
    ImplicitEmotion,
}

impl FeedbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::StyleRequest => "style_request",
            Self::MoodRequest => "mood_request",
            Self::FocusRequest => "focus_request",
            Self::AvoidRequest => "avoid_request",
            Self::LessOfRequest => "less_of_request",
            Self::MoreOfRequest => "more_of_request",
            Self::CustomInstruction => "custom_instruction",
            Self::ImplicitEmotion => "implicit_emotion",
        }
    }
}

/// One recorded feedback event (one turn where at least one rule fired).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub timestamp: DateTime<Utc>,
    pub actions: Vec<FeedbackAction>,
    /// Preference values detected this turn, keyed by kind. BTreeMap keeps
    /// rendering deterministic.
    pub preferences: BTreeMap<String, String>,
    pub custom_instructions: Vec<String>,
    pub raw_message: String,
}

/// Last-detected preference per kind. Single-value kinds are overwritten
/// (most recent wins); custom instructions accumulate up to a cap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub style: Option<String>,
    pub mood: Option<String>,
    pub focus: Option<String>,
    pub avoid: Option<String>,
    pub less_of: Option<String>,
    pub more_of: Option<String>,
    pub implicit_emotion: Option<String>,
    #[serde(default)]
    pub custom_instructions: Vec<String>,
}

impl Preferences {
    pub fn is_empty(&self) -> bool {
        self.style.is_none()
            && self.mood.is_none()
            && self.focus.is_none()
            && self.avoid.is_none()
            && self.less_of.is_none()
            && self.more_of.is_none()
            && self.implicit_emotion.is_none()
            && self.custom_instructions.is_empty()
    }

    /// Append a custom instruction, dropping the oldest past the cap.
    pub fn push_custom_instruction(&mut self, instruction: impl Into<String>) {
        self.custom_instructions.push(instruction.into());
        if self.custom_instructions.len() > CUSTOM_INSTRUCTION_CAP {
            let overflow = self.custom_instructions.len() - CUSTOM_INSTRUCTION_CAP;
            self.custom_instructions.drain(..overflow);
        }
    }
}

/// The mutable per-conversation state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// Most-recent detected emotion labels, oldest first (FIFO, cap 10).
    #[serde(default)]
    pub emotion_history: Vec<String>,

    #[serde(default)]
    pub preferences: Preferences,

    /// Most-recent feedback events, oldest first (cap 15).
    #[serde(default)]
    pub feedback_log: Vec<FeedbackEvent>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a detected emotion, dropping the oldest past the cap.
    pub fn push_emotion(&mut self, emotion: impl Into<String>) {
        self.emotion_history.push(emotion.into());
        if self.emotion_history.len() > EMOTION_HISTORY_CAP {
            let overflow = self.emotion_history.len() - EMOTION_HISTORY_CAP;
            self.emotion_history.drain(..overflow);
        }
    }

    /// Record a feedback event, dropping the oldest past the cap.
    pub fn push_feedback(&mut self, event: FeedbackEvent) {
        self.feedback_log.push(event);
        if self.feedback_log.len() > FEEDBACK_LOG_CAP {
            let overflow = self.feedback_log.len() - FEEDBACK_LOG_CAP;
            self.feedback_log.drain(..overflow);
        }
    }

    /// Sustained affect: the emotion the user has shown for the last three
    /// consecutive turns, if any.
    pub fn sustained_emotion(&self) -> Option<&str> {
        if self.emotion_history.len() < 3 {
            return None;
        }
        let tail = &self.emotion_history[self.emotion_history.len() - 3..];
        if tail[0] == tail[1] && tail[1] == tail[2] {
            Some(tail[0].as_str())
        } else {
            None
        }
    }
}
