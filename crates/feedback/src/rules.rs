//! The fixed rule table: pattern → tagged action kind, evaluated in a fixed
//! priority order. Patterns are case-insensitive; a rule with a capture
//! group yields the captured text as the preference value, otherwise the
//! full matched text is used.

use regex::Regex;

/// The tagged kind a rule maps its match to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Positive,
    Negative,
    Style,
    Mood,
    Focus,
    Avoid,
    LessOf,
    MoreOf,
    Custom,
}

/// One entry of the rule table.
pub struct Rule {
    pub kind: RuleKind,
    pub pattern: Regex,
}

impl Rule {
    fn new(kind: RuleKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).expect("valid feedback rule pattern"),
        }
    }
}

/// Build the ordered rule table. Order is part of the contract: earlier
/// rules take priority when rendering, and tests rely on the sequence.
pub fn rule_table() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleKind::Positive,
            r"(?i)\b(?:i (?:really )?(?:like|love|loved|enjoy|enjoyed) (?:that|this|it)\b|that was (?:great|good|amazing|perfect|wonderful)\b)",
        ),
        Rule::new(
            RuleKind::Negative,
            r"(?i)\b(?:i (?:don't|didn't|do not|did not) (?:like|enjoy)\b|that was (?:bad|boring|terrible|awful)\b|stop (?:doing )?that\b)",
        ),
        Rule::new(RuleKind::Style, r"(?i)\bbe more (\w+)"),
        Rule::new(RuleKind::Mood, r"(?i)\bmake (?:it|this|things) (?:more )?(\w+)"),
        Rule::new(RuleKind::Focus, r"(?i)\bfocus (?:more )?on ([^.!?,]+)"),
        Rule::new(
            RuleKind::Avoid,
            r"(?i)\b(?:don't|do not|stop|avoid) (?:talk about|talking about|mention|mentioning|bring up|bringing up) ([^.!?,]+)",
        ),
        Rule::new(RuleKind::LessOf, r"(?i)\bless (?:of )?(\w+(?: \w+)?)"),
        Rule::new(RuleKind::MoreOf, r"(?i)\bmore (?:of )?(\w+(?: \w+)?)"),
        Rule::new(RuleKind::Custom, r"(?i)\bcan you ([^.!?]+)"),
    ]
}
