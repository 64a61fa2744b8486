//! Coverage accounting.
//!
//! Coverage is always recomputed from summed counts, never by averaging
//! percentages, and is 0 whenever the estimate is 0.

use serde::{Deserialize, Serialize};

/// Coverage of one archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageStats {
    pub items_processed: u64,
    pub total_items_estimate: u64,
    /// Rounded to two decimals; can exceed 100 when the estimate undershoots
    pub coverage_percentage: f64,
    pub file_size_bytes: u64,
}

impl CoverageStats {
    pub fn new(items_processed: u64, total_items_estimate: u64, file_size_bytes: u64) -> Self {
        Self {
            items_processed,
            total_items_estimate,
            coverage_percentage: round2(percentage(items_processed, total_items_estimate)),
            file_size_bytes,
        }
    }

    /// Unrounded coverage percentage.
    pub fn exact_percentage(&self) -> f64 {
        percentage(self.items_processed, self.total_items_estimate)
    }
}

/// Coverage across every archive of a subreddit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallCoverage {
    pub total_items_estimate: u64,
    pub items_processed: u64,
    pub coverage_percentage: f64,
}

/// Accumulates per-archive coverage into an [`OverallCoverage`].
#[derive(Debug, Clone, Default)]
pub struct CoverageTracker {
    items_processed: u64,
    total_items_estimate: u64,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, stats: &CoverageStats) {
        self.items_processed += stats.items_processed;
        self.total_items_estimate += stats.total_items_estimate;
    }

    pub fn overall(&self) -> OverallCoverage {
        OverallCoverage {
            total_items_estimate: self.total_items_estimate,
            items_processed: self.items_processed,
            coverage_percentage: round2(percentage(
                self.items_processed,
                self.total_items_estimate,
            )),
        }
    }
}

fn percentage(processed: u64, estimate: u64) -> f64 {
    if estimate == 0 {
        0.0
    } else {
        processed as f64 / estimate as f64 * 100.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
