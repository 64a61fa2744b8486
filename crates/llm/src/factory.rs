//! LLM provider factory.
//!
//! This module creates LLM clients from the configured provider name,
//! injecting endpoint, credential and organization.

use crate::client::LlmClient;
use crate::providers::openai::DEFAULT_OPENAI_ENDPOINT;
use crate::providers::OpenAiClient;
use std::sync::Arc;
use std::time::Duration;
use subpulse_core::{AppError, AppResult};

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434/v1";

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "openai-compatible", "ollama")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - API key (required for "openai")
/// * `organization` - Optional OpenAI organization id
/// * `timeout` - Per-request timeout
///
/// # Errors
/// Returns `AppError::Config` if:
/// - Provider is unknown
/// - A required secret or endpoint is missing
/// - The HTTP client cannot be built
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    organization: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let api_key = api_key.map(str::to_string);
    let organization = organization.map(str::to_string);

    match provider.to_lowercase().as_str() {
        "openai" => {
            if api_key.is_none() {
                return Err(AppError::Config(
                    "OpenAI provider requires API key".to_string(),
                ));
            }
            let base_url = endpoint.unwrap_or(DEFAULT_OPENAI_ENDPOINT);
            Ok(Arc::new(OpenAiClient::new(base_url, api_key, organization, timeout)?))
        }
        "openai-compatible" => {
            let base_url = endpoint.ok_or_else(|| {
                AppError::Config("openai-compatible provider requires an endpoint".to_string())
            })?;
            let client = OpenAiClient::new(base_url, api_key, organization, timeout)?
                .named("openai-compatible");
            Ok(Arc::new(client))
        }
        "ollama" => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_ENDPOINT);
            let client = OpenAiClient::new(base_url, None, None, timeout)?.named("ollama");
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}
