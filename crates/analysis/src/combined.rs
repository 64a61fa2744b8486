//! Cross-type synthesis of submission and comment analyses.

use std::path::PathBuf;

use subpulse_core::AppResult;

use crate::aggregate::{ArchiveOutcome, Pipeline};
use crate::coverage::OverallCoverage;
use crate::types::{CombinedCoverage, CombinedSummary};

/// Combined summary and where it was written.
#[derive(Debug, Clone)]
pub struct CombinedOutcome {
    pub summary: CombinedSummary,
    pub path: Option<PathBuf>,
}

impl Pipeline {
    /// Synthesize both archive kinds into the subreddit's canonical summary.
    ///
    /// Runs only when both kinds produced a summary. The prompt is built from
    /// every chunk analysis, not from the per-kind summaries. Returns `None`
    /// when the stage does not apply or the request fails.
    pub async fn combine(
        &self,
        submissions: &ArchiveOutcome,
        comments: &ArchiveOutcome,
        overall: &OverallCoverage,
    ) -> AppResult<Option<CombinedOutcome>> {
        if submissions.summary.is_none() || comments.summary.is_none() {
            tracing::info!("Skipping combined analysis: both archive kinds need a summary");
            return Ok(None);
        }

        tracing::info!("Creating combined analysis of submissions and comments");
        let prompt =
            self.prompts
                .combined_prompt(&self.subreddit, &submissions.results, &comments.results)?;
        self.artifacts.combined_prompt(&prompt);

        let Some(analysis) = self.client.analyze(&prompt).await else {
            tracing::error!("Combined analysis failed; per-type summaries remain canonical");
            return Ok(None);
        };
        self.artifacts.combined_analysis(&analysis);

        let summary = CombinedSummary {
            subreddit: self.subreddit.clone(),
            analysis_date: self.analysis_date.clone(),
            submissions_analyzed: submissions.items_analyzed(),
            comments_analyzed: comments.items_analyzed(),
            coverage_data: CombinedCoverage {
                overall: overall.clone(),
                submissions: submissions.coverage.clone(),
                comments: comments.coverage.clone(),
            },
            combined_analysis: analysis,
        };
        let path = self.artifacts.final_summary(&summary);

        Ok(Some(CombinedOutcome { summary, path }))
    }
}
