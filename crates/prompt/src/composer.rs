//! The prompt composer: turns a validated turn request, the conversation's
//! accumulated state, and the enrichment outputs into the ordered segment
//! sequence sent to the generation service.
//!
//! Construction order is a hard contract (see the segment numbering in
//! `compose`); a step whose source data is empty emits nothing, and the
//! output is deterministic for identical inputs.

use charloom_core::character::Character;
use charloom_core::enrichment::Enrichment;
use charloom_core::segment::PromptSegment;
use charloom_core::state::ConversationState;
use charloom_core::turn::TurnRequest;
use tracing::debug;

use crate::templates;
use crate::wordcost;

/// Default history budget, in word-units.
pub const DEFAULT_HISTORY_WORD_BUDGET: usize = 8000;

/// Stateless composer. The only knob is the history word budget.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    history_word_budget: usize,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WORD_BUDGET)
    }
}

impl PromptComposer {
    pub fn new(history_word_budget: usize) -> Self {
        Self {
            history_word_budget,
        }
    }

    /// Build the full segment sequence for one turn.
    ///
    /// Assumes the turn has already passed validation: the character carries
    /// a name and description and an effective message can be derived. The
    /// composer itself cannot fail.
    pub fn compose(
        &self,
        turn: &TurnRequest,
        state: &ConversationState,
        enrichment: &Enrichment,
    ) -> Vec<PromptSegment> {
        let character = &turn.character;
        let scenario = templates::resolve_scenario(character);
        let mut segments = Vec::new();

        // 1. Persona: memory block, profile, scenario, tone, rulebook.
        segments.push(PromptSegment::system(self.persona(turn, &scenario)));

        // 2. Memory reinforcement.
        if memory_text(turn).is_some() {
            segments.push(PromptSegment::system(
                "Always draw on your chat memory: address the user by the name it gives \
                 and reflect your established relationship in every reply.",
            ));
        }

        // 3-5. Enrichment contributions.
        if let Some(knowledge) = non_blank(enrichment.knowledge.as_deref()) {
            segments.push(PromptSegment::system(format!(
                "Relevant knowledge for this turn:\n{knowledge}"
            )));
        }
        if let Some(linguistic) = non_blank(enrichment.linguistic.as_deref()) {
            segments.push(PromptSegment::system(format!(
                "Linguistic analysis of the user's message: {linguistic}"
            )));
        }
        if let Some(insights) = non_blank(enrichment.nlp_insights.as_deref()) {
            segments.push(PromptSegment::system(format!(
                "Additional analysis of the user's message:\n{insights}"
            )));
        }

        // 6. Emotion and accumulated feedback.
        if let Some(segment) = self.emotion_feedback(character, state, enrichment) {
            segments.push(PromptSegment::system(segment));
        }

        // 7. Scenario announcement.
        segments.push(PromptSegment::user(format!("Current scenario: {scenario}")));

        // 8. Bootstrap exchange: a fixed opener and a style exemplar.
        segments.push(PromptSegment::user(templates::BOOTSTRAP_USER_LINE));
        let exemplar = match non_blank(character.first_message.as_deref()) {
            Some(first_message) => first_message.to_string(),
            None => templates::generic_greeting(character),
        };
        segments.push(PromptSegment::assistant(exemplar));

        // 9. History suffix under the word budget, chronological.
        let window = self.history_window(turn);
        debug!(
            included = window.len(),
            supplied = turn.history.len(),
            budget = self.history_word_budget,
            "Composed history window"
        );
        for entry in window {
            if entry.is_user {
                segments.push(PromptSegment::user(entry.text.clone()));
            } else {
                segments.push(PromptSegment::assistant(entry.text.clone()));
            }
        }

        // 10. The current turn itself.
        let current = turn.effective_message().unwrap_or_default();
        segments.push(PromptSegment::user(current));

        segments
    }

    fn persona(&self, turn: &TurnRequest, scenario: &str) -> String {
        let character = &turn.character;
        let mut persona = String::new();

        match memory_text(turn) {
            Some(memory) => {
                persona.push_str("Chat memory (persistent facts about the user and your shared history):\n");
                persona.push_str(memory);
            }
            None => {
                persona.push_str(
                    "No chat memory has been provided. You do not know the user's name or \
                     history. Never invent one and never fall back on generic placeholders \
                     like \"my friend\" or \"dear user\"; if it matters, ask in character.",
                );
            }
        }

        persona.push_str(&format!(
            "\n\nYou are {}, {}.",
            character.name, character.description
        ));
        push_profile_line(&mut persona, "Backstory", &character.backstory);
        push_profile_line(&mut persona, "Personality", &character.personality);
        push_profile_line(&mut persona, "Motivations", &character.motivations);
        push_profile_line(&mut persona, "Values", &character.values);
        push_profile_line(&mut persona, "Accent", &character.accent);

        persona.push_str(&format!("\nScenario: {scenario}"));
        persona.push('\n');
        persona.push_str(templates::tone_directive(character.nsfw));
        persona.push_str("\n\n");
        persona.push_str(templates::BEHAVIORAL_RULES);
        persona
    }

    /// Segment 6. Emitted only when the conversation has accumulated
    /// something to say: a current emotion or sentiment, an emotion history,
    /// or any stored preference. The empathy directive rides along whenever
    /// the segment is emitted.
    fn emotion_feedback(
        &self,
        character: &Character,
        state: &ConversationState,
        enrichment: &Enrichment,
    ) -> Option<String> {
        let mut lines = Vec::new();

        if let Some(emotion) = non_blank(enrichment.emotion.as_deref()) {
            lines.push(format!("The user's current emotion reads as: {emotion}."));
        }
        if let Some(sentiment) = non_blank(enrichment.sentiment.as_deref()) {
            lines.push(format!("The user's message sentiment is: {sentiment}."));
        }
        if !state.emotion_history.is_empty() {
            lines.push(format!(
                "The user's recent emotional trajectory: {}.",
                state.emotion_history.join(", ")
            ));
        }

        let preference_lines = render_preferences(state);
        if lines.is_empty() && preference_lines.is_empty() {
            return None;
        }

        lines.push(templates::empathy_directive(character.personality.as_deref()).to_string());
        lines.extend(preference_lines);

        if let Some(event) = state.feedback_log.last() {
            let actions: Vec<&str> = event.actions.iter().map(|a| a.as_str()).collect();
            let mut line = format!("Most recent feedback ({})", actions.join(", "));
            if !event.preferences.is_empty() {
                let values: Vec<String> = event
                    .preferences
                    .iter()
                    .map(|(kind, value)| format!("{kind}: {value}"))
                    .collect();
                line.push_str(&format!(": {}", values.join("; ")));
            }
            line.push('.');
            lines.push(line);
        }

        Some(lines.join("\n"))
    }

    /// The most recent history entries that fit the word budget, re-reversed
    /// into chronological order. Walking stops at the first entry that would
    /// push the running total past the budget.
    fn history_window<'a>(
        &self,
        turn: &'a TurnRequest,
    ) -> Vec<&'a charloom_core::turn::HistoryEntry> {
        let mut window = Vec::new();
        let mut total = 0usize;
        for entry in turn.history.iter().rev() {
            let cost = wordcost::entry_cost(entry);
            if total + cost > self.history_word_budget {
                break;
            }
            total += cost;
            window.push(entry);
        }
        window.reverse();
        window
    }
}

fn memory_text(turn: &TurnRequest) -> Option<&str> {
    non_blank(turn.chat_memory.as_deref())
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|s| !s.is_empty())
}

fn push_profile_line(persona: &mut String, label: &str, field: &Option<String>) {
    if Character::field_present(field) {
        if let Some(value) = field.as_deref() {
            persona.push_str(&format!("\n{label}: {}", value.trim()));
        }
    }
}

/// One directive line per populated preference kind, in a fixed order.
fn render_preferences(state: &ConversationState) -> Vec<String> {
    let prefs = &state.preferences;
    let mut lines = Vec::new();

    if let Some(style) = prefs.style.as_deref() {
        lines.push(format!("The user asked for a more {style} style."));
    }
    if let Some(mood) = prefs.mood.as_deref() {
        lines.push(format!("Keep the mood {mood}."));
    }
    if let Some(focus) = prefs.focus.as_deref() {
        lines.push(format!("Give extra attention to {focus}."));
    }
    if let Some(avoid) = prefs.avoid.as_deref() {
        lines.push(format!("Do not bring up {avoid}."));
    }
    if let Some(less_of) = prefs.less_of.as_deref() {
        lines.push(format!("Dial back the {less_of}."));
    }
    if let Some(more_of) = prefs.more_of.as_deref() {
        lines.push(format!("Lean further into {more_of}."));
    }
    if let Some(emotion) = prefs.implicit_emotion.as_deref() {
        lines.push(format!(
            "The user has been consistently {emotion}; acknowledge that in your reply."
        ));
    }
    for instruction in &prefs.custom_instructions {
        lines.push(format!("Standing request from the user: {instruction}."));
    }
    lines
}
