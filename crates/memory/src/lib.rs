//! Conversation-state storage backends.
//!
//! The reference behavior kept a process-wide map with no eviction; this
//! crate bounds it: the in-memory backend evicts least-recently-used keys
//! past a configurable cap. A durable backend can implement the same
//! [`charloom_core::ConversationStore`] trait without touching the pipeline.

pub mod in_memory;

pub use in_memory::InMemoryStore;
