//! Generation-service backends.
//!
//! One backend ships today: the OpenAI-compatible chat-completions client.
//! Anything implementing [`charloom_core::generate::Generator`] can stand in
//! for it, which the gateway's tests rely on.

pub mod openai_compat;

pub use openai_compat::OpenAiGenerator;
