//! Run orchestration for one subreddit.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use subpulse_core::{AnalysisSettings, AppConfig, AppError, AppResult, EstimationSettings};
use subpulse_llm::{create_client, AnalysisClient};

use crate::aggregate::{ArchiveOutcome, Pipeline};
use crate::coverage::{CoverageTracker, OverallCoverage};
use crate::discover::subreddit_from_path;
use crate::pacing::{FixedInterval, RequestPacer};
use crate::progress::ProgressReporter;
use crate::prompts::PromptSet;
use crate::source::ZstArchive;
use crate::types::{ArchiveKind, CombinedSummary};

/// Everything needed to analyze one subreddit.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub subreddit: String,
    pub submissions: Option<PathBuf>,
    pub comments: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub prompts_dir: Option<PathBuf>,
    pub analysis: AnalysisSettings,
    pub estimation: EstimationSettings,
}

impl RunRequest {
    /// Resolve archive paths and the subreddit name.
    ///
    /// With only a subreddit, both archives default to
    /// `<data_dir>/<sub>_<kind>.zst`. Without a subreddit, the name comes from
    /// the first explicit archive path.
    pub fn resolve(
        config: &AppConfig,
        subreddit: Option<String>,
        submissions: Option<PathBuf>,
        comments: Option<PathBuf>,
    ) -> AppResult<Self> {
        let (submissions, comments) = match (&subreddit, submissions, comments) {
            (Some(sub), None, None) => (
                Some(default_archive(&config.data_dir, sub, ArchiveKind::Submissions)),
                Some(default_archive(&config.data_dir, sub, ArchiveKind::Comments)),
            ),
            (_, submissions, comments) => (submissions, comments),
        };

        let subreddit = match subreddit {
            Some(sub) => sub,
            None => submissions
                .as_deref()
                .or(comments.as_deref())
                .and_then(subreddit_from_path)
                .ok_or_else(|| {
                    AppError::Config(
                        "Either a subreddit or an archive path must be provided".to_string(),
                    )
                })?,
        };

        Ok(Self {
            subreddit,
            submissions,
            comments,
            output_dir: config.output_dir.clone(),
            prompts_dir: config.prompts_dir.clone(),
            analysis: config.analysis.clone(),
            estimation: config.estimation.clone(),
        })
    }

    /// Output directory of this run.
    pub fn output_root(&self) -> PathBuf {
        self.output_dir.join(&self.subreddit)
    }

    fn archive(&self, kind: ArchiveKind) -> Option<&Path> {
        match kind {
            ArchiveKind::Submissions => self.submissions.as_deref(),
            ArchiveKind::Comments => self.comments.as_deref(),
        }
    }
}

fn default_archive(data_dir: &Path, subreddit: &str, kind: ArchiveKind) -> PathBuf {
    data_dir.join(format!("{}{}", subreddit, kind.archive_suffix()))
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub subreddit: String,
    pub output_root: PathBuf,
    pub submissions: Option<ArchiveOutcome>,
    pub comments: Option<ArchiveOutcome>,
    pub overall: OverallCoverage,
    pub combined: Option<CombinedSummary>,

    /// Root summary written by the combined stage
    pub final_summary_path: Option<PathBuf>,
}

impl RunReport {
    /// Whether every stage that could run produced its summary.
    pub fn is_complete(&self) -> bool {
        let both = self.submissions.is_some() && self.comments.is_some();
        let summaries_ok = [&self.submissions, &self.comments]
            .into_iter()
            .flatten()
            .all(|o| o.summary.is_some());
        summaries_ok && (!both || self.combined.is_some())
    }
}

/// Build the analysis client from configuration.
///
/// Fails with `AppError::Config` when the provider needs a credential that is
/// not configured. Nothing is read or sent before this check.
pub fn connect(config: &AppConfig) -> AppResult<AnalysisClient> {
    let api_key = config.require_api_key()?;
    config.validate()?;

    if let Some(key) = api_key {
        tracing::debug!("Using API key {}", subpulse_core::logging::mask_secret(key));
    }

    let client = create_client(
        &config.provider,
        config.endpoint.as_deref(),
        api_key,
        config.organization.as_deref(),
        config.request_timeout(),
    )?;

    Ok(AnalysisClient::new(client, &config.model, config.max_tokens)
        .with_temperature(config.temperature))
}

/// Create the output root, check the credential and run the analysis.
pub async fn run_from_config(
    config: &AppConfig,
    request: &RunRequest,
    progress: ProgressReporter,
) -> AppResult<RunReport> {
    std::fs::create_dir_all(request.output_root())?;
    let client = connect(config)?;
    let pacer = Arc::new(FixedInterval::from_secs(
        config.analysis.request_interval_secs,
    ));
    run_analysis(request, client, pacer, progress).await
}

/// Analyze the submissions and comments of one subreddit.
///
/// A missing or unreadable archive is logged and skipped; only fatal
/// configuration errors are returned.
pub async fn run_analysis(
    request: &RunRequest,
    client: AnalysisClient,
    pacer: Arc<dyn RequestPacer>,
    progress: ProgressReporter,
) -> AppResult<RunReport> {
    let output_root = request.output_root();
    std::fs::create_dir_all(&output_root)?;

    tracing::info!("Starting analysis for r/{}", request.subreddit);
    tracing::info!("Output directory: {}", output_root.display());

    let prompts = PromptSet::load(request.prompts_dir.as_deref())?;
    let pipeline = Pipeline::new(
        request.subreddit.clone(),
        client,
        prompts,
        pacer,
        request.analysis.clone(),
        request.estimation.clone(),
        progress,
        &output_root,
    );

    let mut tracker = CoverageTracker::new();
    let submissions = process_kind(&pipeline, request, ArchiveKind::Submissions).await?;
    let comments = process_kind(&pipeline, request, ArchiveKind::Comments).await?;

    for outcome in [&submissions, &comments].into_iter().flatten() {
        tracker.add(&outcome.coverage);
    }
    let overall = tracker.overall();
    tracing::info!(
        "Overall coverage: {}/{} items ({}%)",
        overall.items_processed,
        overall.total_items_estimate,
        overall.coverage_percentage
    );

    let combined = match (&submissions, &comments) {
        (Some(subs), Some(coms)) => pipeline.combine(subs, coms, &overall).await?,
        _ => None,
    };

    let (combined, final_summary_path) = match combined {
        Some(c) => (Some(c.summary), c.path),
        None => (None, None),
    };

    tracing::info!("Analysis of r/{} complete", request.subreddit);

    Ok(RunReport {
        subreddit: request.subreddit.clone(),
        output_root,
        submissions,
        comments,
        overall,
        combined,
        final_summary_path,
    })
}

async fn process_kind(
    pipeline: &Pipeline,
    request: &RunRequest,
    kind: ArchiveKind,
) -> AppResult<Option<ArchiveOutcome>> {
    let Some(path) = request.archive(kind) else {
        return Ok(None);
    };

    if !path.exists() {
        tracing::warn!("No {} archive at {}; skipping", kind, path.display());
        return Ok(None);
    }

    let source = ZstArchive::new(path);
    match pipeline.process_archive(kind, &source).await {
        Ok(outcome) => Ok(Some(outcome)),
        Err(e) if e.kind().is_fatal() => Err(e),
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "Skipping {} archive: {}", kind, e);
            Ok(None)
        }
    }
}
