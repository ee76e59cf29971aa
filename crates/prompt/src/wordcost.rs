//! Word-count proxy for token cost.
//!
//! The generation service's real constraint is its context window, measured
//! in tokens. Exact tokenization is model-specific, so the history window is
//! budgeted in whitespace-separated words instead. The approximation must
//! stay conservatively under the window; words undercount tokens slightly,
//! which the budget's headroom absorbs.

use charloom_core::turn::HistoryEntry;

/// Approximate token cost of a piece of text: its whitespace-separated
/// word count.
pub fn approximate_token_cost(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Cost of one history entry under the same approximation.
pub fn entry_cost(entry: &HistoryEntry) -> usize {
    approximate_token_cost(&entry.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_whitespace_separated_words() {
        assert_eq!(approximate_token_cost("one two three"), 3);
        assert_eq!(approximate_token_cost("  padded\t\nwords  "), 2);
        assert_eq!(approximate_token_cost(""), 0);
        assert_eq!(approximate_token_cost("   "), 0);
    }

    #[test]
    fn entry_cost_uses_text_only() {
        assert_eq!(entry_cost(&HistoryEntry::user("hello there friend")), 3);
        assert_eq!(entry_cost(&HistoryEntry::assistant("")), 0);
    }
}
