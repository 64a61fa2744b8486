//! Completion client abstraction.
//!
//! The pipeline treats the completion service as text in, text out. Anything
//! provider-specific lives behind [`LlmClient`].

use serde::{Deserialize, Serialize};
use subpulse_core::AppResult;

/// One prompt sent as a single user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub prompt: String,
    pub model: String,

    /// Completion token cap; provider default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// First completion choice returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,

    /// Model that answered, as reported by the service
    pub model: String,

    pub usage: LlmUsage,
}

/// Token accounting of one request. All zero when the service reports none.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    pub fn is_reported(&self) -> bool {
        self.total_tokens > 0
    }
}

/// A completion provider.
///
/// Non-success HTTP answers must surface as `AppError::LlmStatus` so callers
/// can classify them; transport problems surface as `AppError::Llm`.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Name used in logs ("openai", "ollama", ...).
    fn provider_name(&self) -> &str;

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("Analyze r/rust", "gpt-4o")
            .with_max_tokens(4000)
            .with_temperature(0.7);
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.max_tokens, Some(4000));
        assert_eq!(request.temperature, Some(0.7));

        let json = serde_json::to_value(LlmRequest::new("p", "m")).unwrap();
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_usage() {
        let usage = LlmUsage::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
        assert!(usage.is_reported());
        assert!(!LlmUsage::default().is_reported());
    }
}
