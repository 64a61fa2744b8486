//! OpenAI chat completions provider.
//!
//! Works against api.openai.com and any server exposing the same
//! `/chat/completions` contract (vLLM, llama.cpp server, Ollama's `/v1`).

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use subpulse_core::{AppError, AppResult};

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Upper bound on one completion request, including reading the body.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completions response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenAI-compatible LLM client.
pub struct OpenAiClient {
    /// Base URL, without the `/chat/completions` suffix
    base_url: String,

    /// Bearer token; omitted for keyless local servers
    api_key: Option<String>,

    /// Value of the `OpenAI-Organization` header
    organization: Option<String>,

    /// Name reported by `provider_name`
    name: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client for the given base URL.
    ///
    /// A request that has not completed within `timeout` fails with
    /// `AppError::Llm`.
    ///
    /// # Errors
    /// * `AppError::Config` - If the HTTP client cannot be built
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        organization: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            organization,
            name: "openai".to_string(),
            client,
        })
    }

    /// Override the provider name reported in logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn to_chat_request(&self, request: &LlmRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    fn convert_response(&self, response: ChatResponse) -> AppResult<LlmResponse> {
        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("Completion response contained no choices".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content,
            model: response.model,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending request to {} using model: {}", self.name, request.model);
        tracing::debug!("Prompt length: {} bytes", request.prompt.len());

        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(&self.to_chat_request(request));

        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }
        if let Some(ref org) = self.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to {}: {}", self.name, e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::LlmStatus { status, message });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse completion response: {}", e)))?;

        let converted = self.convert_response(chat)?;
        tracing::debug!(
            "Received completion: {} tokens in, {} tokens out",
            converted.usage.prompt_tokens,
            converted.usage.completion_tokens
        );

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisClient;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, api_key: Option<&str>, organization: Option<&str>) -> OpenAiClient {
        OpenAiClient::new(
            base_url,
            api_key.map(str::to_string),
            organization.map(str::to_string),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
        .unwrap()
    }

    #[test]
    fn test_chat_request_conversion() {
        let client = test_client(DEFAULT_OPENAI_ENDPOINT, None, None);
        let request = LlmRequest::new("Hello", "gpt-4o")
            .with_temperature(0.7)
            .with_max_tokens(100);

        let chat = client.to_chat_request(&request);
        assert_eq!(chat.model, "gpt-4o");
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.messages[0].role, "user");
        assert_eq!(chat.messages[0].content, "Hello");
        assert_eq!(chat.max_tokens, Some(100));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = test_client("http://localhost:11434/v1/", None, None);
        assert_eq!(client.base_url, "http://localhost:11434/v1");
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("OpenAI-Organization", "org-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o",
                "choices": [{"message": {"role": "assistant", "content": "Pain points: ..."}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("sk-test"), Some("org-1"));
        let response = client
            .complete(&LlmRequest::new("Analyze", "gpt-4o"))
            .await
            .unwrap();

        assert_eq!(response.content, "Pain points: ...");
        assert_eq!(response.usage.total_tokens, 16);
    }

    #[tokio::test]
    async fn test_complete_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("sk-test"), None);
        let err = client
            .complete(&LlmRequest::new("Analyze", "gpt-4o"))
            .await
            .unwrap_err();

        match err {
            AppError::LlmStatus { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_without_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o",
                "choices": []
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None, None);
        let err = client
            .complete(&LlmRequest::new("Analyze", "gpt-4o"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_stalled_request_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "model": "gpt-4o",
                        "choices": [{"message": {"role": "assistant", "content": "late"}}]
                    }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(server.uri(), None, None, Duration::from_millis(200)).unwrap();
        let err = client
            .complete(&LlmRequest::new("Analyze", "gpt-4o"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));

        let analysis = AnalysisClient::new(Arc::new(client), "gpt-4o", 4000);
        assert_eq!(analysis.analyze("Analyze").await, None);
    }
}
