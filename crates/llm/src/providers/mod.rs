//! LLM provider implementations.

pub mod openai;
pub mod scripted;

pub use openai::OpenAiClient;
pub use scripted::{ScriptedClient, ScriptedOutcome};
