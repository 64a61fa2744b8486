//! Analysis client used by the summarization pipeline.
//!
//! Wraps any [`LlmClient`] with the run's model settings. A failed request is
//! classified and logged, and the caller only ever sees `None`: chunk and
//! aggregation stages handle absence, not failure subtypes.

use std::sync::Arc;
use std::time::Instant;

use crate::client::{LlmClient, LlmRequest};
use subpulse_core::AppError;

/// Classification of a failed completion request, for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 401/403: key invalid, expired or lacking permission
    Authentication,
    /// 429: usage or rate limits hit
    RateLimited,
    /// 404: model missing or not available to this key
    ModelUnavailable,
    /// Request never produced an HTTP answer
    Transport,
    Other,
}

impl FailureKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => FailureKind::Authentication,
            429 => FailureKind::RateLimited,
            404 => FailureKind::ModelUnavailable,
            _ => FailureKind::Other,
        }
    }

    pub fn classify(err: &AppError) -> Self {
        match err {
            AppError::LlmStatus { status, .. } => Self::from_status(*status),
            AppError::Llm(_) => FailureKind::Transport,
            _ => FailureKind::Other,
        }
    }

    /// Operator-facing hint for this failure.
    pub fn hint(self, model: &str) -> String {
        match self {
            FailureKind::Authentication => {
                "Authentication error: the API key may be invalid or expired".to_string()
            }
            FailureKind::RateLimited => {
                "Rate limit exceeded: API usage limits have been hit".to_string()
            }
            FailureKind::ModelUnavailable => format!(
                "Model not found: '{}' may not exist or this key has no access to it",
                model
            ),
            FailureKind::Transport => "The completion service could not be reached".to_string(),
            FailureKind::Other => "The completion service rejected the request".to_string(),
        }
    }
}

/// Sends analysis prompts with fixed model parameters.
#[derive(Clone)]
pub struct AnalysisClient {
    client: Arc<dyn LlmClient>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnalysisClient {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request an analysis of `prompt`.
    ///
    /// Returns `None` on any failure; the failure is classified and logged.
    pub async fn analyze(&self, prompt: &str) -> Option<String> {
        let request = LlmRequest::new(prompt, &self.model)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let start = Instant::now();
        let result = self.client.complete(&request).await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(response) => {
                tracing::info!(
                    provider = self.client.provider_name(),
                    elapsed_secs = elapsed,
                    "Analysis completed in {:.2} seconds",
                    elapsed
                );
                if response.usage.is_reported() {
                    tracing::debug!(
                        prompt_tokens = response.usage.prompt_tokens,
                        completion_tokens = response.usage.completion_tokens,
                        "Token usage"
                    );
                }
                Some(response.content)
            }
            Err(err) => {
                let kind = FailureKind::classify(&err);
                tracing::error!(
                    provider = self.client.provider_name(),
                    failure = ?kind,
                    "Error calling completion API: {}",
                    err
                );
                tracing::error!("{}", kind.hint(&self.model));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ScriptedClient, ScriptedOutcome};

    #[test]
    fn test_status_classification() {
        assert_eq!(FailureKind::from_status(401), FailureKind::Authentication);
        assert_eq!(FailureKind::from_status(403), FailureKind::Authentication);
        assert_eq!(FailureKind::from_status(429), FailureKind::RateLimited);
        assert_eq!(FailureKind::from_status(404), FailureKind::ModelUnavailable);
        assert_eq!(FailureKind::from_status(500), FailureKind::Other);
        assert_eq!(
            FailureKind::classify(&AppError::Llm("connection refused".into())),
            FailureKind::Transport
        );
    }

    #[test]
    fn test_model_hint_names_model() {
        assert!(FailureKind::ModelUnavailable.hint("gpt-9").contains("gpt-9"));
    }

    #[tokio::test]
    async fn test_failures_become_none() {
        let scripted = Arc::new(ScriptedClient::new([
            ScriptedOutcome::Status(429, "slow down".into()),
            ScriptedOutcome::Transport("reset".into()),
            ScriptedOutcome::Reply("themes".into()),
        ]));
        let client = AnalysisClient::new(scripted.clone(), "gpt-4o", 4000);

        assert_eq!(client.analyze("a").await, None);
        assert_eq!(client.analyze("b").await, None);
        assert_eq!(client.analyze("c").await.as_deref(), Some("themes"));
        assert_eq!(scripted.prompts(), vec!["a", "b", "c"]);
    }
}
