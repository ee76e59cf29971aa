//! Completion post-processing.
//!
//! Generation services echo recent context verbatim when fed large history
//! windows plus repeated behavioral instructions; without this pass the
//! conversation visibly loops. `clean` tightens action/thought markup, then
//! applies three anti-repetition passes: intra-reply sentence dedup,
//! cross-turn sentence dedup against prior assistant messages, and
//! repeated three-word-window suppression.

use charloom_core::turn::HistoryEntry;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Sentences at or below this normalized length are exempt from cross-turn
/// dedup, so short incidental phrases ("I see.") survive repetition.
pub const TRIVIAL_SENTENCE_LEN: usize = 20;

static ACTION_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\s*([^*\n]+?)\s*\*").expect("valid action-span pattern"));
static THOUGHT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\s*([^_\n]+?)\s*_").expect("valid thought-span pattern"));

/// Clean a raw completion against the turn's history.
///
/// Never fails: empty input produces empty output, and no input can make
/// the pass panic or grow the text.
pub fn clean(raw_text: &str, history: &[HistoryEntry]) -> String {
    if raw_text.trim().is_empty() {
        return String::new();
    }

    let tightened = tighten_markup(raw_text);
    let sentences = split_sentences(&tightened);
    let total = sentences.len();

    let deduped = dedup_sentences(sentences, history);
    if deduped.len() < total {
        debug!(
            dropped = total - deduped.len(),
            kept = deduped.len(),
            "Dropped repeated sentences from completion"
        );
    }

    suppress_repeated_windows(&deduped.join(" "))
}

/// Re-wrap `*action*` and `_thought_` spans tightly, with no whitespace
/// padding inside the delimiters.
fn tighten_markup(text: &str) -> String {
    let text = ACTION_SPAN.replace_all(text, "*${1}*");
    THOUGHT_SPAN.replace_all(&text, "_${1}_").into_owned()
}

/// Split on sentence-final punctuation followed by whitespace or
/// end-of-text. Trailing closers (quotes, markup delimiters, brackets)
/// stay attached to their sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            while let Some(&next) = chars.peek() {
                if matches!(next, '.' | '!' | '?' | '"' | '\'' | '*' | '_' | ')') {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if chars.peek().is_none_or(|n| n.is_whitespace()) {
                push_sentence(&mut sentences, &mut current);
            }
        }
    }
    push_sentence(&mut sentences, &mut current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Case-insensitive comparison form: lowercased, whitespace collapsed.
fn normalize(sentence: &str) -> String {
    sentence
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Passes (a) and (b): drop sentences already seen earlier in this reply,
/// then drop non-trivial sentences already present in a prior assistant
/// message. First occurrence wins, order is preserved.
fn dedup_sentences(sentences: Vec<String>, history: &[HistoryEntry]) -> Vec<String> {
    let prior_assistant: Vec<String> = history
        .iter()
        .filter(|entry| !entry.is_user)
        .map(|entry| normalize(&entry.text))
        .collect();

    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for sentence in sentences {
        let normalized = normalize(&sentence);
        if !seen.insert(normalized.clone()) {
            continue;
        }
        let trivial = normalized.chars().count() <= TRIVIAL_SENTENCE_LEN;
        if !trivial && prior_assistant.iter().any(|prior| prior.contains(&normalized)) {
            continue;
        }
        kept.push(sentence);
    }
    kept
}

/// Pass (c): walk the words, skipping any word whose three-word window
/// (the last two emitted words plus the candidate, case-insensitive) has
/// already occurred in this reply.
fn suppress_repeated_windows(text: &str) -> String {
    let mut seen = HashSet::new();
    let mut emitted: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        if let [.., a, b] = emitted.as_slice() {
            let window = format!(
                "{} {} {}",
                a.to_lowercase(),
                b.to_lowercase(),
                word.to_lowercase()
            );
            if !seen.insert(window) {
                continue;
            }
        }
        emitted.push(word);
    }
    emitted.join(" ")
}
