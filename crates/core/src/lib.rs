//! # Charloom Core
//!
//! Domain types, traits, and error definitions for the Charloom character-chat
//! pipeline. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability (text generation, sentiment/emotion
//! classification, conversation-state storage) is defined as a trait here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod character;
pub mod enrichment;
pub mod error;
pub mod generate;
pub mod segment;
pub mod state;
pub mod store;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use character::Character;
pub use enrichment::{Classifier, Enrichment};
pub use error::{Error, GenerationError, Result, StoreError, ValidationError};
pub use generate::{GenerationRequest, Generator};
pub use segment::{PromptSegment, SegmentRole};
pub use state::{ConversationState, FeedbackAction, FeedbackEvent, Preferences};
pub use store::{ConversationKey, ConversationStore};
pub use turn::{HistoryEntry, TurnRequest};
