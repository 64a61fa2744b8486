//! Prompt system for Subpulse.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in chunk, meta and combined analysis prompts
//! - Per-run overrides loaded from a prompts directory
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{CHUNK_ANALYSIS, COMBINED_ANALYSIS, META_ANALYSIS};
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, PromptDefinition, PromptOutputSpec};
