//! Rendering of chunk, meta and combined analysis prompts.

use std::collections::HashMap;
use std::path::Path;

use subpulse_core::AppResult;
use subpulse_prompt::{
    build_prompt, load_prompt, PromptDefinition, CHUNK_ANALYSIS, COMBINED_ANALYSIS,
    META_ANALYSIS,
};

use crate::types::{AnalysisResult, ArchiveKind, Chunk, ChunkMetadata, ContentItem};

/// The three prompt definitions used by a run.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub chunk: PromptDefinition,
    pub meta: PromptDefinition,
    pub combined: PromptDefinition,
}

impl PromptSet {
    /// Load the built-in prompts, letting `<id>.yml` files in `prompts_dir`
    /// override them.
    pub fn load(prompts_dir: Option<&Path>) -> AppResult<Self> {
        Ok(Self {
            chunk: load_prompt(prompts_dir, CHUNK_ANALYSIS)?,
            meta: load_prompt(prompts_dir, META_ANALYSIS)?,
            combined: load_prompt(prompts_dir, COMBINED_ANALYSIS)?,
        })
    }

    /// Prompt for one chunk.
    pub fn chunk_prompt(
        &self,
        subreddit: &str,
        kind: ArchiveKind,
        chunk: &Chunk,
        metadata: &ChunkMetadata,
    ) -> AppResult<String> {
        let mut vars = HashMap::new();
        vars.insert("subreddit".to_string(), subreddit.to_string());
        vars.insert(
            "earliest".to_string(),
            metadata.date_range.earliest.clone().unwrap_or_else(|| "unknown".to_string()),
        );
        vars.insert(
            "latest".to_string(),
            metadata.date_range.latest.clone().unwrap_or_else(|| "unknown".to_string()),
        );
        vars.insert("item_count".to_string(), metadata.post_count.to_string());
        vars.insert("unique_authors".to_string(), metadata.unique_authors.to_string());
        vars.insert("content".to_string(), format_content(&chunk.items, kind));

        Ok(build_prompt(&self.chunk, &vars)?.text)
    }

    /// Prompt asking for a synthesis of several chunk analyses.
    pub fn meta_prompt(
        &self,
        subreddit: &str,
        results: &[AnalysisResult],
        coverage_percentage: f64,
    ) -> AppResult<String> {
        let analyses = results
            .iter()
            .map(|r| format!("## Chunk {} Analysis\n\n{}", r.chunk_id, r.analysis))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut vars = HashMap::new();
        vars.insert("subreddit".to_string(), subreddit.to_string());
        vars.insert("chunk_count".to_string(), results.len().to_string());
        vars.insert(
            "coverage_percentage".to_string(),
            format!("{:.2}", coverage_percentage),
        );
        vars.insert("analyses".to_string(), analyses);

        Ok(build_prompt(&self.meta, &vars)?.text)
    }

    /// Prompt combining every chunk analysis of both archive kinds.
    pub fn combined_prompt(
        &self,
        subreddit: &str,
        submissions: &[AnalysisResult],
        comments: &[AnalysisResult],
    ) -> AppResult<String> {
        let sections = [
            (ArchiveKind::Submissions, submissions),
            (ArchiveKind::Comments, comments),
        ];
        let analyses = sections
            .iter()
            .flat_map(|(kind, results)| {
                results.iter().map(move |r| {
                    format!(
                        "## {} Chunk {} Analysis\n\n{}",
                        kind.title(),
                        r.chunk_id,
                        r.analysis
                    )
                })
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut vars = HashMap::new();
        vars.insert("subreddit".to_string(), subreddit.to_string());
        vars.insert("analyses".to_string(), analyses);

        Ok(build_prompt(&self.combined, &vars)?.text)
    }
}

/// Render records as the content block of a chunk prompt.
///
/// Comments whose body is empty or removed are left out; submissions are
/// always rendered, with their body only when it is visible.
pub fn format_content(items: &[ContentItem], kind: ArchiveKind) -> String {
    items
        .iter()
        .filter_map(|item| match kind {
            ArchiveKind::Submissions => Some(format_submission(item)),
            ArchiveKind::Comments => format_comment(item),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_submission(item: &ContentItem) -> String {
    let mut text = format!(
        "POST [Score: {}, Comments: {}, Date: {}]\nTITLE: {}\n",
        item.score(),
        item.num_comments(),
        format_date(item),
        item.title.as_deref().unwrap_or("No Title"),
    );
    if let Some(body) = item.visible_selftext() {
        text.push_str("CONTENT: ");
        text.push_str(body);
        text.push('\n');
    }
    text
}

fn format_comment(item: &ContentItem) -> Option<String> {
    let body = item.visible_body()?;
    Some(format!(
        "COMMENT [Score: {}, Date: {}]\nCONTENT: {}\n",
        item.score(),
        format_date(item),
        body
    ))
}

fn format_date(item: &ContentItem) -> String {
    item.created_at()
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::extract_metadata;
    use serde_json::json;

    fn item(value: serde_json::Value) -> ContentItem {
        serde_json::from_value(value).unwrap()
    }

    fn result(chunk_id: usize, analysis: &str) -> AnalysisResult {
        AnalysisResult {
            chunk_id,
            metadata: ChunkMetadata::default(),
            analysis: analysis.to_string(),
        }
    }

    #[test]
    fn test_format_submissions() {
        let items = vec![
            item(json!({
                "created_utc": 1704067200, "score": 42, "num_comments": 7,
                "title": "Borrow checker woes", "selftext": "Why does this not compile?"
            })),
            item(json!({"created_utc": 1704067200, "selftext": "[removed]"})),
        ];

        let text = format_content(&items, ArchiveKind::Submissions);
        assert_eq!(
            text,
            "POST [Score: 42, Comments: 7, Date: 2024-01-01]\n\
             TITLE: Borrow checker woes\n\
             CONTENT: Why does this not compile?\n\
             \n\n\
             POST [Score: 0, Comments: 0, Date: 2024-01-01]\n\
             TITLE: No Title\n"
        );
    }

    #[test]
    fn test_format_comments_skips_removed() {
        let items = vec![
            item(json!({"created_utc": 1704067200, "score": 3, "body": "Use Arc here"})),
            item(json!({"body": "[deleted]"})),
            item(json!({"body": ""})),
            item(json!({"created_utc": "garbage", "body": "Or Rc"})),
        ];

        let text = format_content(&items, ArchiveKind::Comments);
        assert_eq!(
            text,
            "COMMENT [Score: 3, Date: 2024-01-01]\nCONTENT: Use Arc here\n\
             \n\n\
             COMMENT [Score: 0, Date: unknown]\nCONTENT: Or Rc\n"
        );
    }

    #[test]
    fn test_chunk_prompt() {
        let prompts = PromptSet::load(None).unwrap();
        let chunk = Chunk {
            ordinal: 1,
            items: vec![item(json!({
                "created_utc": 1704067200, "author": "ferris", "score": 1, "body": "hello"
            }))],
        };
        let metadata = extract_metadata(&chunk.items);

        let prompt = prompts
            .chunk_prompt("rust", ArchiveKind::Comments, &chunk, &metadata)
            .unwrap();
        assert!(prompt.contains("r/rust"));
        assert!(prompt.contains("Time period: 2024-01-01 to 2024-01-01"));
        assert!(prompt.contains("Sample size: 1 posts/comments"));
        assert!(prompt.contains("COMMENT [Score: 1, Date: 2024-01-01]\nCONTENT: hello"));

        let again = prompts
            .chunk_prompt("rust", ArchiveKind::Comments, &chunk, &metadata)
            .unwrap();
        assert_eq!(prompt, again);
    }

    #[test]
    fn test_meta_prompt_orders_chunks() {
        let prompts = PromptSet::load(None).unwrap();
        let results = vec![result(1, "first"), result(3, "third")];

        let prompt = prompts.meta_prompt("rust", &results, 12.3456).unwrap();
        assert!(prompt.contains("2 separate analyses"));
        assert!(prompt.contains("approximately 12.35%"));
        let first = prompt.find("## Chunk 1 Analysis\n\nfirst").unwrap();
        let third = prompt.find("## Chunk 3 Analysis\n\nthird").unwrap();
        assert!(first < third);
    }

    #[test]
    fn test_combined_prompt_uses_chunk_analyses() {
        let prompts = PromptSet::load(None).unwrap();
        let prompt = prompts
            .combined_prompt(
                "rust",
                &[result(1, "sub one")],
                &[result(1, "com one"), result(2, "com two")],
            )
            .unwrap();

        let sub = prompt.find("## Submissions Chunk 1 Analysis\n\nsub one").unwrap();
        let com1 = prompt.find("## Comments Chunk 1 Analysis\n\ncom one").unwrap();
        let com2 = prompt.find("## Comments Chunk 2 Analysis\n\ncom two").unwrap();
        assert!(sub < com1 && com1 < com2);
        assert!(prompt.contains("6. Overall themes"));
    }
}
