//! Check command handler.
//!
//! Reports the configured credential and sends a minimal completion request.

use clap::Args;
use subpulse_core::{config::AppConfig, logging::mask_secret, AppResult};
use subpulse_llm::{create_client, FailureKind, LlmClient, LlmRequest};
use subpulse_prompt::list_prompts;

/// Check credentials and send a test request
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Model used for the test request (defaults to the configured model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Only report configuration; send no request
    #[arg(long)]
    pub offline: bool,
}

impl CheckCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing check command");

        println!("Provider: {}", config.provider);

        match config.api_key {
            Some(ref key) => println!("API key (masked): {}", mask_secret(key)),
            None => println!("API key found: No ({})", config.api_key_env),
        }

        match config.organization {
            Some(ref org) => println!("Organization ID: {}", org),
            None => println!("Organization ID found: No"),
        }

        let prompts = list_prompts(config.prompts_dir.as_deref())?;
        println!("Prompts: {}", prompts.join(", "));

        if self.offline {
            return Ok(());
        }

        let api_key = config.require_api_key()?;
        let client = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            api_key,
            config.organization.as_deref(),
            config.request_timeout(),
        )?;

        let model = self.model.as_deref().unwrap_or(&config.model);
        println!("Testing with model: {}", model);

        let request = LlmRequest::new("Say hello", model).with_max_tokens(10);
        match client.complete(&request).await {
            Ok(response) => {
                println!("Success! Response: {}", response.content.trim());
                Ok(())
            }
            Err(e) => {
                let kind = FailureKind::classify(&e);
                println!("Request failed: {}", e);
                println!("{}", kind.hint(model));
                Err(e)
            }
        }
    }
}
