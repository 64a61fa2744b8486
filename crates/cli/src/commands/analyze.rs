//! Analyze command handler.
//!
//! Runs the full pipeline for one subreddit.

use clap::Args;
use std::path::PathBuf;
use subpulse_analysis::{run_from_config, RunReport, RunRequest};
use subpulse_core::{config::AppConfig, AppError, AppResult};

use super::stderr_progress;

/// Analyze one subreddit's submissions and comments
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Subreddit name; archives default to <data-dir>/<name>_<kind>.zst
    #[arg(short, long)]
    pub subreddit: Option<String>,

    /// Path to the submissions archive
    #[arg(long)]
    pub submissions: Option<PathBuf>,

    /// Path to the comments archive
    #[arg(long)]
    pub comments: Option<PathBuf>,

    /// Directory holding the archives
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Root directory for results
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of posts/comments per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Maximum number of chunks analyzed per archive
    #[arg(long)]
    pub max_chunks: Option<usize>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory of prompt overrides (<id>.yml)
    #[arg(long)]
    pub prompts_dir: Option<PathBuf>,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeCommand {
    /// Execute the analyze command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing analyze command");
        tracing::debug!("Analyze options: {:?}", self);

        if self.subreddit.is_none() && self.submissions.is_none() && self.comments.is_none() {
            return Err(AppError::Config(
                "Either --submissions, --comments, or --subreddit must be provided".to_string(),
            ));
        }

        let mut config = config.clone().with_run_overrides(
            self.data_dir.clone(),
            self.output_dir.clone(),
            self.chunk_size,
            self.max_chunks,
        );
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if self.prompts_dir.is_some() {
            config.prompts_dir = self.prompts_dir.clone();
        }

        let request = RunRequest::resolve(
            &config,
            self.subreddit.clone(),
            self.submissions.clone(),
            self.comments.clone(),
        )?;

        let progress = if self.json {
            Default::default()
        } else {
            stderr_progress()
        };
        let report = run_from_config(&config, &request, progress).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        } else {
            print_report(&report);
        }

        Ok(())
    }
}

fn print_report(report: &RunReport) {
    println!("Subreddit: r/{}", report.subreddit);
    println!("Output: {}", report.output_root.display());

    for outcome in [&report.submissions, &report.comments].into_iter().flatten() {
        println!();
        println!("{}:", outcome.kind.title());
        println!(
            "  Items: {} of ~{} ({}%)",
            outcome.coverage.items_processed,
            outcome.coverage.total_items_estimate,
            outcome.coverage.coverage_percentage
        );
        println!(
            "  Chunks analyzed: {}/{}",
            outcome.chunks_analyzed, outcome.chunks_attempted
        );
        match outcome.summary_path {
            Some(ref path) => println!("  Summary: {}", path.display()),
            None => println!("  Summary: not produced"),
        }
    }

    println!();
    println!(
        "Overall coverage: {}/{} ({}%)",
        report.overall.items_processed,
        report.overall.total_items_estimate,
        report.overall.coverage_percentage
    );
    if let Some(ref path) = report.final_summary_path {
        println!("Combined summary: {}", path.display());
    }
    if !report.is_complete() {
        println!("Some stages produced no summary; see the log for details");
    }
}
