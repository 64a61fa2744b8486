//! Bounded ingestion.

use subpulse_core::{AppError, AppResult, ErrorKind, EstimationSettings};

use crate::progress::ProgressReporter;
use crate::source::RecordSource;
use crate::types::ContentItem;

/// Records materialized from one archive.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    /// Records in archive order, at most `limit`
    pub items: Vec<ContentItem>,

    /// Lines that were not valid records
    pub skipped_lines: u64,

    /// Compressed bytes read when ingestion stopped
    pub bytes_consumed: u64,

    /// Whether the limit stopped ingestion before the archive ended
    pub reached_cap: bool,
}

/// Read `source` from its first record until it ends or `limit` records are
/// buffered.
///
/// Unparseable lines are skipped. Any other stream error aborts the archive.
pub fn ingest(
    source: &dyn RecordSource,
    file_size: u64,
    limit: usize,
    settings: &EstimationSettings,
    progress: &ProgressReporter,
) -> AppResult<IngestOutcome> {
    let mut outcome = IngestOutcome {
        items: Vec::with_capacity(limit.min(100_000)),
        ..Default::default()
    };

    if limit == 0 {
        outcome.reached_cap = true;
        return Ok(outcome);
    }

    for record in source.open()? {
        let record = match record {
            Ok(record) => record,
            Err(AppError::Parse(msg)) => {
                outcome.skipped_lines += 1;
                tracing::warn!(kind = ?ErrorKind::RecoverableParse, "Skipping line: {}", msg);
                continue;
            }
            Err(e) => return Err(e),
        };

        outcome.bytes_consumed = record.bytes_consumed;
        outcome.items.push(record.item);

        let n = outcome.items.len() as u64;
        if settings.ingest_log_interval > 0 && n % settings.ingest_log_interval == 0 {
            let pct = if file_size > 0 {
                outcome.bytes_consumed as f64 / file_size as f64 * 100.0
            } else {
                0.0
            };
            tracing::info!("Processed {} items ({:.2}% of file)", n, pct);
            progress.ingest(n, outcome.bytes_consumed, file_size);
        }

        if outcome.items.len() >= limit {
            tracing::info!("Reached ingest limit of {} items", limit);
            outcome.reached_cap = true;
            break;
        }
    }

    tracing::info!(
        "Ingested {} items from {} ({} lines skipped)",
        outcome.items.len(),
        source.describe(),
        outcome.skipped_lines
    );
    Ok(outcome)
}
