//! Scripted in-process provider.
//!
//! Replays a fixed queue of outcomes and records every prompt it receives.
//! Once the queue is drained it answers `scripted response <n>`, where `n` is
//! the 1-based call number. Used to drive the pipeline deterministically in
//! tests and dry runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use subpulse_core::{AppError, AppResult};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Successful completion with this text
    Reply(String),
    /// Non-success HTTP status with a body
    Status(u16, String),
    /// Transport-level failure
    Transport(String),
}

#[derive(Debug, Default)]
pub struct ScriptedClient {
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Client whose every call succeeds with the default reply.
    pub fn always_ok() -> Self {
        Self::default()
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let call = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| AppError::Llm("scripted client poisoned".to_string()))?;
            prompts.push(request.prompt.clone());
            prompts.len()
        };

        let outcome = self
            .outcomes
            .lock()
            .map_err(|_| AppError::Llm("scripted client poisoned".to_string()))?
            .pop_front()
            .unwrap_or_else(|| ScriptedOutcome::Reply(format!("scripted response {}", call)));

        match outcome {
            ScriptedOutcome::Reply(content) => Ok(LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            ScriptedOutcome::Status(status, message) => {
                Err(AppError::LlmStatus { status, message })
            }
            ScriptedOutcome::Transport(message) => Err(AppError::Llm(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_then_defaults() {
        let client = ScriptedClient::new([
            ScriptedOutcome::Reply("first".into()),
            ScriptedOutcome::Status(401, "bad key".into()),
        ]);
        let request = LlmRequest::new("p", "m");

        assert_eq!(client.complete(&request).await.unwrap().content, "first");
        assert_eq!(client.complete(&request).await.unwrap_err().status(), Some(401));
        assert_eq!(
            client.complete(&request).await.unwrap().content,
            "scripted response 3"
        );
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.prompts(), vec!["p", "p", "p"]);
    }
}
