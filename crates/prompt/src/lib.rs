//! Prompt composition.
//!
//! Assembles the ordered, role-tagged segment sequence for one turn: persona
//! and behavioral rules, optional memory and enrichment blocks, accumulated
//! preferences, a bootstrap exemplar exchange, a budget-bounded history
//! window, and the effective current message.

pub mod composer;
pub mod templates;
pub mod wordcost;

pub use composer::{DEFAULT_HISTORY_WORD_BUDGET, PromptComposer};
