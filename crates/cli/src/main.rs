//! Subpulse CLI
//!
//! Main entry point for the subpulse command-line tool.
//! Analyzes subreddit archive dumps with an LLM and writes per-chunk,
//! per-archive and combined summaries.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AnalyzeCommand, BatchCommand, CheckCommand};
use std::path::PathBuf;
use subpulse_core::{config::AppConfig, logging, AppError, AppResult};

/// Subpulse - surface community pain points from subreddit archives
#[derive(Parser, Debug)]
#[command(name = "subpulse")]
#[command(about = "Surface community pain points from subreddit archives", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "SUBPULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// LLM provider (openai, openai-compatible, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// API base URL of the provider
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one subreddit's submissions and comments
    Analyze(AnalyzeCommand),

    /// Analyze every subreddit in a data directory that has no output yet
    Batch(BatchCommand),

    /// Check credentials and send a test request
    Check(CheckCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load defaults, config file, .env and environment
    let config = AppConfig::load(cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.provider,
        None,
        cli.endpoint,
        cli.log_level,
        cli.log_file,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        config.log_file.as_deref(),
    )?;

    tracing::info!("Subpulse CLI starting");
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Analyze(_) => "analyze",
        Commands::Batch(_) => "batch",
        Commands::Check(_) => "check",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Analyze(cmd) => cmd.execute(&config).await,
        Commands::Batch(cmd) => cmd
            .execute(&config)
            .await
            .map_err(|e| AppError::Other(format!("{:#}", e))),
        Commands::Check(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!(kind = ?e.kind(), "Command failed: {}", e),
    }

    result
}
