//! Per-archive pipeline: estimate, ingest, chunk, analyze and aggregate.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use subpulse_core::{AnalysisSettings, AppResult, EstimationSettings};
use subpulse_llm::AnalysisClient;

use crate::artifacts::ArtifactWriter;
use crate::chunker::chunk_items;
use crate::coverage::CoverageStats;
use crate::estimate::{estimate_total, SizeEstimate};
use crate::ingest::ingest;
use crate::metadata::extract_metadata;
use crate::pacing::RequestPacer;
use crate::progress::ProgressReporter;
use crate::prompts::PromptSet;
use crate::source::RecordSource;
use crate::types::{
    items_analyzed, AggregatedSummary, AnalysisResult, ArchiveKind, Chunk, SummaryText,
};

/// Result of running one archive through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutcome {
    pub kind: ArchiveKind,
    pub estimate: SizeEstimate,
    pub coverage: CoverageStats,
    pub chunks_attempted: usize,
    pub chunks_analyzed: usize,

    /// Successful chunk analyses in ordinal order
    #[serde(skip)]
    pub results: Vec<AnalysisResult>,

    /// Absent when no chunk succeeded or the meta-analysis failed
    #[serde(skip)]
    pub summary: Option<AggregatedSummary>,

    pub summary_path: Option<PathBuf>,
}

impl ArchiveOutcome {
    pub fn items_analyzed(&self) -> usize {
        items_analyzed(&self.results)
    }
}

/// Sequential analysis pipeline for one subreddit.
pub struct Pipeline {
    pub(crate) subreddit: String,
    pub(crate) client: AnalysisClient,
    pub(crate) prompts: PromptSet,
    pub(crate) pacer: Arc<dyn RequestPacer>,
    pub(crate) analysis: AnalysisSettings,
    pub(crate) estimation: EstimationSettings,
    pub(crate) progress: ProgressReporter,
    pub(crate) artifacts: ArtifactWriter,
    pub(crate) analysis_date: String,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subreddit: impl Into<String>,
        client: AnalysisClient,
        prompts: PromptSet,
        pacer: Arc<dyn RequestPacer>,
        analysis: AnalysisSettings,
        estimation: EstimationSettings,
        progress: ProgressReporter,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        let subreddit = subreddit.into();
        Self {
            artifacts: ArtifactWriter::new(subreddit.clone(), output_root),
            subreddit,
            client,
            prompts,
            pacer,
            analysis,
            estimation,
            progress,
            analysis_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// Fix the date stamped into summaries.
    pub fn with_analysis_date(mut self, date: impl Into<String>) -> Self {
        self.analysis_date = date.into();
        self
    }

    pub fn subreddit(&self) -> &str {
        &self.subreddit
    }

    pub fn artifacts(&self) -> &ArtifactWriter {
        &self.artifacts
    }

    /// Run one archive through every per-archive stage.
    ///
    /// Errors are archive-level (unreadable archive) or fatal (prompt
    /// configuration). LLM failures never surface here; they only reduce the
    /// number of analyzed chunks.
    pub async fn process_archive(
        &self,
        kind: ArchiveKind,
        source: &dyn RecordSource,
    ) -> AppResult<ArchiveOutcome> {
        tracing::info!("Processing {} archive: {}", kind, source.describe());

        let file_size = source.size_bytes()?;
        let estimate = estimate_total(source, file_size, &self.estimation, &self.progress);

        let ingested = ingest(
            source,
            file_size,
            self.analysis.ingest_limit(),
            &self.estimation,
            &self.progress,
        )?;

        let coverage = CoverageStats::new(
            ingested.items.len() as u64,
            estimate.total_items,
            file_size,
        );
        tracing::info!(
            "{} coverage: {}/{} items ({:.2}%)",
            kind,
            coverage.items_processed,
            coverage.total_items_estimate,
            coverage.exact_percentage()
        );

        let chunks = chunk_items(
            ingested.items,
            self.analysis.chunk_size,
            self.analysis.max_chunks,
        );
        let chunks_attempted = chunks.len();
        let results = self.analyze_chunks(kind, &chunks).await?;

        if !results.is_empty() {
            self.artifacts.all_analyses(kind, &results);
        }

        let summary = self.summarize(kind, &results, &coverage).await?;
        let summary_path = summary
            .as_ref()
            .and_then(|s| self.artifacts.summary(kind, s));

        Ok(ArchiveOutcome {
            kind,
            estimate,
            coverage,
            chunks_attempted,
            chunks_analyzed: results.len(),
            results,
            summary,
            summary_path,
        })
    }

    async fn analyze_chunks(
        &self,
        kind: ArchiveKind,
        chunks: &[Chunk],
    ) -> AppResult<Vec<AnalysisResult>> {
        let mut results = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            tracing::info!(
                "Analyzing {} chunk {}/{} ({} items)",
                kind,
                chunk.ordinal,
                chunks.len(),
                chunk.items.len()
            );

            let metadata = extract_metadata(&chunk.items);
            let prompt = self
                .prompts
                .chunk_prompt(&self.subreddit, kind, chunk, &metadata)?;
            self.artifacts.chunk_prompt(kind, chunk.ordinal, &prompt);
            self.progress.analyze(kind, chunk.ordinal, chunks.len());

            match self.client.analyze(&prompt).await {
                Some(analysis) => {
                    self.artifacts.chunk_analysis(kind, chunk.ordinal, &analysis);
                    results.push(AnalysisResult {
                        chunk_id: chunk.ordinal,
                        metadata,
                        analysis,
                    });
                }
                None => tracing::warn!("No analysis for {} chunk {}; skipping", kind, chunk.ordinal),
            }

            if i + 1 < chunks.len() {
                self.pacer.pause().await;
            }
        }

        Ok(results)
    }

    async fn summarize(
        &self,
        kind: ArchiveKind,
        results: &[AnalysisResult],
        coverage: &CoverageStats,
    ) -> AppResult<Option<AggregatedSummary>> {
        let text = match results {
            [] => {
                tracing::warn!("No {} chunks were analyzed; no summary produced", kind);
                return Ok(None);
            }
            [only] => SummaryText::SingleChunk(only.analysis.clone()),
            _ => {
                tracing::info!("Creating meta-analysis of {} {} chunks", results.len(), kind);
                let prompt = self.prompts.meta_prompt(
                    &self.subreddit,
                    results,
                    coverage.exact_percentage(),
                )?;
                self.artifacts.meta_prompt(kind, &prompt);

                match self.client.analyze(&prompt).await {
                    Some(meta) => {
                        self.artifacts.meta_analysis(kind, &meta);
                        SummaryText::Meta(meta)
                    }
                    None => {
                        tracing::error!("Meta-analysis of {} failed; no summary produced", kind);
                        return Ok(None);
                    }
                }
            }
        };

        Ok(Some(AggregatedSummary {
            subreddit: self.subreddit.clone(),
            chunks_analyzed: results.len(),
            total_posts_analyzed: items_analyzed(results),
            coverage_data: coverage.clone(),
            analysis_date: self.analysis_date.clone(),
            text,
        }))
    }
}
