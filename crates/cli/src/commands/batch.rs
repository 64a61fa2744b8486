//! Batch command handler.
//!
//! Analyzes every subreddit found in a data directory that has no output
//! directory yet, one after another.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use subpulse_analysis::{pending_subreddits, run_from_config, RunRequest};
use subpulse_core::config::AppConfig;

use super::stderr_progress;

/// Analyze every subreddit in a data directory that has no output yet
#[derive(Args, Debug)]
pub struct BatchCommand {
    /// Directory holding <name>_(submissions|comments).zst archives
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Root directory for results
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of chunks analyzed per archive
    #[arg(long)]
    pub max_chunks: Option<usize>,

    /// Number of posts/comments per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

impl BatchCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing batch command");
        tracing::debug!("Batch options: {:?}", self);

        let config = config.clone().with_run_overrides(
            self.data_dir.clone(),
            self.output_dir.clone(),
            self.chunk_size,
            self.max_chunks,
        );

        // Fail once up front instead of once per subreddit
        config.require_api_key()?;
        config.validate()?;

        let pending = pending_subreddits(&config.data_dir, &config.output_dir)
            .with_context(|| format!("Failed to scan {}", config.data_dir.display()))?;

        if pending.is_empty() {
            println!("All subreddits have already been analyzed!");
            return Ok(());
        }

        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("Failed to create {}", config.output_dir.display())
        })?;

        let total = pending.len();
        println!("Found {} subreddits to analyze", total);

        let mut failed = 0usize;
        for (i, subreddit) in pending.into_iter().enumerate() {
            println!("[{}/{}] Analyzing r/{}", i + 1, total, subreddit);

            let request = RunRequest::resolve(&config, Some(subreddit.clone()), None, None)?;
            match run_from_config(&config, &request, stderr_progress()).await {
                Ok(report) if report.is_complete() => {
                    println!("Analyzed r/{}", subreddit);
                }
                Ok(_) => {
                    println!("Analyzed r/{} with missing summaries", subreddit);
                }
                Err(e) if e.kind().is_fatal() => {
                    return Err(e).with_context(|| format!("Aborting batch at r/{}", subreddit));
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!("Error analyzing r/{}: {}", subreddit, e);
                    println!("Error analyzing r/{}: {}", subreddit, e);
                }
            }
        }

        println!("Batch complete: {} analyzed, {} failed", total - failed, failed);
        Ok(())
    }
}
