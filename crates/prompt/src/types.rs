//! Prompt definition types.

use serde::{Deserialize, Serialize};

/// Prompt definition as stored in YAML.
///
/// ```yaml
/// id: analysis.meta
/// title: Meta-Analysis
/// apiVersion: "1.0"
/// output:
///   format: markdown
/// template: |
///   # Meta-Analysis of r/{{subreddit}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub id: String,
    pub title: String,

    /// `major.minor` schema version
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Handlebars template; HTML escaping is off
    pub template: String,

    #[serde(default)]
    pub output: PromptOutputSpec,
}

/// Format the model is asked to answer in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOutputSpec {
    pub format: String,
}

impl Default for PromptOutputSpec {
    fn default() -> Self {
        Self {
            format: "markdown".to_string(),
        }
    }
}

/// Rendered prompt text and the definition it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub text: String,
    pub source_prompt_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_defaults_to_markdown() {
        let yaml = r#"
id: analysis.chunk
title: Chunk Analysis
apiVersion: "1.0"
template: "r/{{subreddit}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "analysis.chunk");
        assert_eq!(def.api_version, "1.0");
        assert_eq!(def.output.format, "markdown");
    }
}
