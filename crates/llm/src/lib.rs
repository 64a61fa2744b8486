//! LLM integration crate for Subpulse.
//!
//! This crate provides a provider-agnostic abstraction for sending analysis
//! prompts to a text completion service, plus the [`AnalysisClient`] that the
//! pipeline uses to turn failures into "no analysis produced".
//!
//! # Providers
//! - **OpenAI** chat completions (default)
//! - **OpenAI-compatible** endpoints, including a local Ollama server
//! - **Scripted**: deterministic in-process client for tests
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use subpulse_llm::{LlmClient, LlmRequest, providers::OpenAiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiClient::new(
//!     "https://api.openai.com/v1",
//!     Some("sk-...".to_string()),
//!     None,
//!     Duration::from_secs(300),
//! )?;
//! let request = LlmRequest::new("Summarize r/rust", "gpt-4o");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use analysis::{AnalysisClient, FailureKind};
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OpenAiClient, ScriptedClient};
