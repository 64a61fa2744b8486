//! Size estimation.
//!
//! Small archives are counted exactly with a full pass. Large archives are
//! sampled from the start and extrapolated by compressed bytes, which assumes
//! record size does not drift across the archive. Sampled figures are known
//! to be approximate and are reported as such.

use serde::{Deserialize, Serialize};
use subpulse_core::{AppError, EstimationSettings};

use crate::progress::ProgressReporter;
use crate::source::RecordSource;

/// How a [`SizeEstimate`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateMethod {
    Exact,
    Sampled,
    Heuristic,
}

/// Estimated record count of one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEstimate {
    pub total_items: u64,
    pub method: EstimateMethod,
}

impl SizeEstimate {
    pub fn exact(total_items: u64) -> Self {
        Self {
            total_items,
            method: EstimateMethod::Exact,
        }
    }

    /// Whether the figure should be treated as lower-confidence.
    pub fn is_approximate(&self) -> bool {
        self.method != EstimateMethod::Exact
    }
}

/// Estimate the number of records in `source`.
///
/// Never fails: read errors degrade to the byte-size heuristic, and an
/// archive whose size is unknown estimates to 0.
pub fn estimate_total(
    source: &dyn RecordSource,
    file_size: u64,
    settings: &EstimationSettings,
    progress: &ProgressReporter,
) -> SizeEstimate {
    if file_size < settings.exact_count_threshold_bytes {
        tracing::info!(
            "Counting records in {} ({} bytes)",
            source.describe(),
            file_size
        );
        match count_exact(source, settings, progress) {
            Ok(count) => {
                tracing::info!("Exact count: {} items", count);
                SizeEstimate::exact(count)
            }
            Err(e) => {
                tracing::warn!(
                    kind = ?e.kind(),
                    "Exact count of {} failed: {}; using size heuristic",
                    source.describe(),
                    e
                );
                heuristic(file_size, settings)
            }
        }
    } else {
        tracing::info!(
            "Archive {} is large ({} bytes), estimating from a {}-item sample",
            source.describe(),
            file_size,
            settings.sample_size
        );
        sample(source, file_size, settings, progress)
    }
}

/// Count every record. Unparseable lines are not records and are skipped.
fn count_exact(
    source: &dyn RecordSource,
    settings: &EstimationSettings,
    progress: &ProgressReporter,
) -> Result<u64, AppError> {
    let mut count = 0u64;
    for record in source.open()? {
        match record {
            Ok(_) => {
                count += 1;
                if settings.count_log_interval > 0 && count % settings.count_log_interval == 0 {
                    tracing::info!("Counted {} items so far", count);
                    progress.count(count);
                }
            }
            Err(AppError::Parse(msg)) => tracing::debug!("Skipping unparseable line: {}", msg),
            Err(e) => return Err(e),
        }
    }
    Ok(count)
}

fn sample(
    source: &dyn RecordSource,
    file_size: u64,
    settings: &EstimationSettings,
    progress: &ProgressReporter,
) -> SizeEstimate {
    let stream = match source.open() {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("Failed to sample {}: {}; using size heuristic", source.describe(), e);
            return heuristic(file_size, settings);
        }
    };

    let mut sampled = 0u64;
    let mut bytes = 0u64;
    let mut exhausted = true;

    for record in stream {
        match record {
            Ok(record) => {
                sampled += 1;
                bytes = record.bytes_consumed;
                if sampled >= settings.sample_size {
                    exhausted = false;
                    break;
                }
            }
            Err(AppError::Parse(msg)) => tracing::debug!("Skipping unparseable line: {}", msg),
            Err(e) => {
                tracing::warn!(
                    "Sampling {} failed after {} items: {}; using size heuristic",
                    source.describe(),
                    sampled,
                    e
                );
                return heuristic(file_size, settings);
            }
        }
    }

    progress.sample(sampled, settings.sample_size, bytes);

    if exhausted {
        tracing::info!("Archive ended within the sample: {} items", sampled);
        return SizeEstimate::exact(sampled);
    }

    if bytes == 0 {
        tracing::warn!("Sample consumed no bytes; using size heuristic");
        return heuristic(file_size, settings);
    }

    let total = (sampled as f64 / bytes as f64 * file_size as f64) as u64;
    tracing::info!(
        "Estimated {} items from {} sampled over {} bytes (approximate)",
        total,
        sampled,
        bytes
    );
    SizeEstimate {
        total_items: total,
        method: EstimateMethod::Sampled,
    }
}

fn heuristic(file_size: u64, settings: &EstimationSettings) -> SizeEstimate {
    let total_items = file_size
        .checked_div(settings.fallback_bytes_per_item)
        .unwrap_or(0);
    tracing::info!(
        "Heuristic estimate: {} items ({} bytes / {} bytes per item)",
        total_items,
        file_size,
        settings.fallback_bytes_per_item
    );
    SizeEstimate {
        total_items,
        method: EstimateMethod::Heuristic,
    }
}
