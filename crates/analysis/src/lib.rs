//! Subreddit archive analysis pipeline.
//!
//! Streams records out of compressed archives, estimates archive size, caps
//! ingestion at `chunk_size * max_chunks` records, and folds per-chunk LLM
//! analyses into per-archive and combined summaries. Everything runs
//! sequentially; the only suspension points are LLM requests and the pause
//! between chunk requests.

pub mod aggregate;
pub mod artifacts;
pub mod chunker;
pub mod combined;
pub mod coverage;
pub mod discover;
pub mod estimate;
pub mod ingest;
pub mod metadata;
pub mod pacing;
pub mod progress;
pub mod prompts;
pub mod run;
pub mod source;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use aggregate::{ArchiveOutcome, Pipeline};
pub use artifacts::ArtifactWriter;
pub use chunker::chunk_items;
pub use combined::CombinedOutcome;
pub use coverage::{CoverageStats, CoverageTracker, OverallCoverage};
pub use discover::{discover_subreddits, parse_archive_name, pending_subreddits, subreddit_from_path};
pub use estimate::{estimate_total, EstimateMethod, SizeEstimate};
pub use ingest::{ingest, IngestOutcome};
pub use metadata::extract_metadata;
pub use pacing::{FixedInterval, NoPacing, RequestPacer};
pub use progress::{ProgressCallback, ProgressEvent, ProgressReporter};
pub use prompts::{format_content, PromptSet};
pub use run::{connect, run_analysis, run_from_config, RunReport, RunRequest};
pub use source::{RecordSource, RecordStream, SourceRecord, ZstArchive};
pub use types::{
    AggregatedSummary, AnalysisResult, ArchiveKind, Chunk, ChunkMetadata, CombinedSummary,
    ContentItem, SummaryText,
};
