//! Feedback & preference extraction.
//!
//! Scans each incoming user message against a fixed, ordered rule table to
//! detect sentiment, style requests, and explicit instructions, then updates
//! the per-conversation state in place. Absence of matches is the normal
//! case and is silent — a feedback-log entry is recorded only when at least
//! one rule fired this turn.

pub mod rules;

pub use rules::{Rule, RuleKind};

use charloom_core::state::{ConversationState, FeedbackAction, FeedbackEvent};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::debug;

/// The feedback extractor. Compiles the rule table once; create one and
/// reuse it across turns.
pub struct FeedbackExtractor {
    rules: Vec<Rule>,
}

impl FeedbackExtractor {
    pub fn new() -> Self {
        Self {
            rules: rules::rule_table(),
        }
    }

    /// Apply the rule table to one message, mutating the conversation state.
    ///
    /// Semantics: only the first match per rule counts; multiple distinct
    /// rules may each fire once. Single-value preference kinds are
    /// overwritten (most recent wins); custom instructions accumulate.
    /// Sustained affect (three identical trailing emotion-history entries)
    /// is recorded as an implicit-emotion preference.
    pub fn extract(&self, message: &str, state: &mut ConversationState) {
        let mut actions: Vec<FeedbackAction> = Vec::new();
        let mut detected: BTreeMap<String, String> = BTreeMap::new();
        let mut customs: Vec<String> = Vec::new();

        for rule in &self.rules {
            let Some(caps) = rule.pattern.captures(message) else {
                continue;
            };
            // Captured group if the rule has one, else the full matched text.
            let value = caps
                .get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            match rule.kind {
                RuleKind::Positive => actions.push(FeedbackAction::Positive),
                RuleKind::Negative => actions.push(FeedbackAction::Negative),
                RuleKind::Style => {
                    state.preferences.style = Some(value.clone());
                    detected.insert("style".into(), value);
                    actions.push(FeedbackAction::StyleRequest);
                }
                RuleKind::Mood => {
                    state.preferences.mood = Some(value.clone());
                    detected.insert("mood".into(), value);
                    actions.push(FeedbackAction::MoodRequest);
                }
                RuleKind::Focus => {
                    state.preferences.focus = Some(value.clone());
                    detected.insert("focus".into(), value);
                    actions.push(FeedbackAction::FocusRequest);
                }
                RuleKind::Avoid => {
                    state.preferences.avoid = Some(value.clone());
                    detected.insert("avoid".into(), value);
                    actions.push(FeedbackAction::AvoidRequest);
                }
                RuleKind::LessOf => {
                    state.preferences.less_of = Some(value.clone());
                    detected.insert("less_of".into(), value);
                    actions.push(FeedbackAction::LessOfRequest);
                }
                RuleKind::MoreOf => {
                    state.preferences.more_of = Some(value.clone());
                    detected.insert("more_of".into(), value);
                    actions.push(FeedbackAction::MoreOfRequest);
                }
                RuleKind::Custom => {
                    state.preferences.push_custom_instruction(value.clone());
                    customs.push(value);
                    actions.push(FeedbackAction::CustomInstruction);
                }
            }
        }

        // Sustained affect counts as an unstated preference.
        if let Some(sustained) = state.sustained_emotion().map(str::to_string) {
            state.preferences.implicit_emotion = Some(sustained.clone());
            detected.insert("implicit_emotion".into(), sustained);
            actions.push(FeedbackAction::ImplicitEmotion);
        }

        if actions.is_empty() {
            return;
        }

        debug!(actions = actions.len(), "Feedback detected");
        state.push_feedback(FeedbackEvent {
            timestamp: Utc::now(),
            actions,
            preferences: detected,
            custom_instructions: customs,
            raw_message: message.to_string(),
        });
    }
}

impl Default for FeedbackExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(message: &str, state: &mut ConversationState) {
        FeedbackExtractor::new().extract(message, state);
    }

    #[test]
    fn no_match_is_silent() {
        let mut state = ConversationState::new();
        extract("Tell me about the castle gardens.", &mut state);
        assert!(state.feedback_log.is_empty());
        assert!(state.preferences.is_empty());
    }

    #[test]
    fn positive_sentiment_fires() {
        let mut state = ConversationState::new();
        extract("I really loved that, keep going!", &mut state);
        assert_eq!(state.feedback_log.len(), 1);
        assert!(state.feedback_log[0]
            .actions
            .contains(&FeedbackAction::Positive));
    }

    #[test]
    fn style_request_captures_value() {
        let mut state = ConversationState::new();
        extract("Could you be more poetic when you describe things?", &mut state);
        assert_eq!(state.preferences.style.as_deref(), Some("poetic"));
        assert!(state.feedback_log[0]
            .actions
            .contains(&FeedbackAction::StyleRequest));
    }

    #[test]
    fn most_recent_style_wins() {
        let mut state = ConversationState::new();
        extract("be more poetic", &mut state);
        extract("be more blunt", &mut state);
        assert_eq!(state.preferences.style.as_deref(), Some("blunt"));
        assert_eq!(state.feedback_log.len(), 2);
    }

    #[test]
    fn first_match_per_rule_within_one_message() {
        let mut state = ConversationState::new();
        extract("be more poetic. Also be more somber.", &mut state);
        assert_eq!(state.preferences.style.as_deref(), Some("poetic"));
        // One style action, not two.
        let style_count = state.feedback_log[0]
            .actions
            .iter()
            .filter(|a| **a == FeedbackAction::StyleRequest)
            .count();
        assert_eq!(style_count, 1);
    }

    #[test]
    fn multiple_rules_co_fire() {
        let mut state = ConversationState::new();
        extract(
            "That was great! Focus on the garden. And don't mention the war.",
            &mut state,
        );
        let actions = &state.feedback_log[0].actions;
        assert!(actions.contains(&FeedbackAction::Positive));
        assert!(actions.contains(&FeedbackAction::FocusRequest));
        assert!(actions.contains(&FeedbackAction::AvoidRequest));
        assert_eq!(state.preferences.focus.as_deref(), Some("the garden"));
        assert_eq!(state.preferences.avoid.as_deref(), Some("the war"));
    }

    #[test]
    fn custom_instruction_accumulates() {
        let mut state = ConversationState::new();
        extract("Can you describe the room first?", &mut state);
        extract("Can you speak in riddles?", &mut state);
        assert_eq!(state.preferences.custom_instructions.len(), 2);
        assert_eq!(
            state.preferences.custom_instructions[0],
            "describe the room first"
        );
    }

    #[test]
    fn implicit_emotion_after_three_identical() {
        let mut state = ConversationState::new();
        state.push_emotion("joy");
        state.push_emotion("joy");
        state.push_emotion("joy");

        extract("What happens next?", &mut state);

        assert_eq!(state.preferences.implicit_emotion.as_deref(), Some("joy"));
        assert_eq!(state.feedback_log.len(), 1);
        assert!(state.feedback_log[0]
            .actions
            .contains(&FeedbackAction::ImplicitEmotion));
        assert_eq!(
            state.feedback_log[0].preferences.get("implicit_emotion"),
            Some(&"joy".to_string())
        );
    }

    #[test]
    fn mixed_emotions_stay_implicit_free() {
        let mut state = ConversationState::new();
        state.push_emotion("joy");
        state.push_emotion("anger");
        state.push_emotion("joy");

        extract("What happens next?", &mut state);
        assert!(state.preferences.implicit_emotion.is_none());
        assert!(state.feedback_log.is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let mut state = ConversationState::new();
        extract("BE MORE DRAMATIC", &mut state);
        assert_eq!(state.preferences.style.as_deref(), Some("DRAMATIC"));
    }

    #[test]
    fn less_and_more_requests() {
        let mut state = ConversationState::new();
        extract("less fighting please, more romance", &mut state);
        assert_eq!(state.preferences.less_of.as_deref(), Some("fighting please"));
        assert_eq!(state.preferences.more_of.as_deref(), Some("romance"));
    }
}
