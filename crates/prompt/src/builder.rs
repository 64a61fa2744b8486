//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use std::collections::HashMap;
use subpulse_core::{AppError, AppResult};

/// Build a prompt from a definition and input variables.
///
/// Rendering is deterministic: the same definition and variables always
/// produce byte-identical text.
///
/// # Example
/// ```no_run
/// use subpulse_prompt::{build_prompt, load_prompt, CHUNK_ANALYSIS};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(None, CHUNK_ANALYSIS)?;
/// let mut vars = HashMap::new();
/// vars.insert("subreddit".to_string(), "rust".to_string());
///
/// let built = build_prompt(&def, &vars)?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let text = render_template(&definition.template, variables)?;

    Ok(BuiltPrompt {
        text,
        source_prompt_id: definition.id.clone(),
    })
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Community content is plain text, never HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
