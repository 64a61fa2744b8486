//! Prompt loader for built-in and overriding YAML prompt definitions.

use crate::builtin::{builtin_ids, builtin_source};
use crate::types::PromptDefinition;
use std::path::Path;
use subpulse_core::{AppError, AppResult};

/// Load a prompt definition by ID.
///
/// A file named `<id>.yml` in `prompts_dir` takes precedence over the
/// built-in definition with the same ID. A `prompts_dir` that does not exist
/// is an error.
///
/// # Example
/// ```no_run
/// use subpulse_prompt::{load_prompt, META_ANALYSIS};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Some(Path::new("prompts")), META_ANALYSIS)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: Option<&Path>, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(dir) = prompts_dir {
        ensure_dir(dir)?;

        let prompt_file = dir.join(format!("{}.yml", prompt_id));
        if prompt_file.exists() {
            tracing::debug!("Loading prompt override from: {:?}", prompt_file);

            let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to read prompt file {:?}: {}",
                    prompt_file, e
                ))
            })?;

            let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
            tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
            return Ok(definition);
        }
    }

    let source = builtin_source(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;
    parse_prompt(source, prompt_id)
}

/// List all available prompt IDs: built-ins plus any extra files in `prompts_dir`.
pub fn list_prompts(prompts_dir: Option<&Path>) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = builtin_ids().map(str::to_string).collect();

    if let Some(dir) = prompts_dir {
        ensure_dir(dir)?;

        for entry in walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !prompt_ids.iter().any(|id| id == stem) {
                        prompt_ids.push(stem.to_string());
                    }
                }
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

fn ensure_dir(dir: &Path) -> AppResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(AppError::Prompt(format!(
            "Prompts directory not found: {}",
            dir.display()
        )))
    }
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{CHUNK_ANALYSIS, COMBINED_ANALYSIS, META_ANALYSIS};
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, body: &str) {
        fs::write(dir.join(format!("{}.yml", id)), body).unwrap();
    }

    #[test]
    fn test_builtins_load_and_validate() {
        for id in [CHUNK_ANALYSIS, META_ANALYSIS, COMBINED_ANALYSIS] {
            let def = load_prompt(None, id).unwrap();
            assert_eq!(def.id, id);
            assert!(def.template.contains("{{subreddit}}"));
        }
    }

    #[test]
    fn test_override_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            META_ANALYSIS,
            "id: analysis.meta\ntitle: Short\napiVersion: \"1.1\"\ntemplate: \"{{analyses}}\"\n",
        );

        let def = load_prompt(Some(temp_dir.path()), META_ANALYSIS).unwrap();
        assert_eq!(def.title, "Short");
        assert_eq!(def.template, "{{analyses}}");

        // Other prompts still come from the built-ins
        let chunk = load_prompt(Some(temp_dir.path()), CHUNK_ANALYSIS).unwrap();
        assert_eq!(chunk.title, "Subreddit Community Analysis");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), CHUNK_ANALYSIS, "invalid: yaml: content:");
        assert!(load_prompt(Some(temp_dir.path()), CHUNK_ANALYSIS).is_err());

        write_prompt(
            temp_dir.path(),
            META_ANALYSIS,
            "id: analysis.meta\ntitle: Bad\napiVersion: \"1\"\ntemplate: x\n",
        );
        assert!(load_prompt(Some(temp_dir.path()), META_ANALYSIS).is_err());
    }

    #[test]
    fn test_missing_prompts_dir_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("no-such-prompts");

        let err = load_prompt(Some(&missing), CHUNK_ANALYSIS).unwrap_err();
        assert!(matches!(err, AppError::Prompt(_)));
        assert!(err.kind().is_fatal());
        assert!(list_prompts(Some(&missing)).is_err());
    }

    #[test]
    fn test_unknown_prompt() {
        assert!(load_prompt(None, "nonexistent").is_err());
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "custom.extra",
            "id: custom.extra\ntitle: Extra\napiVersion: \"1.0\"\ntemplate: x\n",
        );
        write_prompt(
            temp_dir.path(),
            META_ANALYSIS,
            "id: analysis.meta\ntitle: Short\napiVersion: \"1.1\"\ntemplate: x\n",
        );

        let prompts = list_prompts(Some(temp_dir.path())).unwrap();
        assert_eq!(
            prompts,
            vec!["analysis.chunk", "analysis.combined", "analysis.meta", "custom.extra"]
        );
    }
}
