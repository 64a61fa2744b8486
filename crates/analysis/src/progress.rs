//! Structured progress reporting for long-running pipeline phases.
//!
//! Counting a large archive or reading it for analysis can take minutes; the
//! reporter gives observable, incremental feedback without coupling the
//! pipeline to any particular output.

use std::sync::Arc;
use std::time::Instant;

use crate::types::ArchiveKind;

/// Progress event emitted during a run.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the operation: "count", "sample", "ingest", "analyze"
    pub phase: String,

    /// Current progress (records read, chunks analyzed, ...)
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    /// Human-readable message
    pub message: String,

    /// Elapsed time since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let percentage =
            total.map(|t| if t > 0 { (current as f64 / t as f64) * 100.0 } else { 0.0 });

        Self {
            phase: phase.into(),
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    /// Override the percentage when it is not `current / total`.
    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => format!("{}", self.current),
        };

        let pct = match self.percentage {
            Some(p) => format!(" ({:.2}%)", p),
            None => String::new(),
        };

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// Create a reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let event = event.with_elapsed(elapsed);

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            percentage = ?event.percentage,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    /// Records counted during an exact size pass.
    pub fn count(&self, counted: u64) {
        self.emit(ProgressEvent::new(
            "count",
            counted,
            None,
            format!("counted {} items so far", counted),
        ));
    }

    /// Sample finished for a large archive.
    pub fn sample(&self, sampled: u64, sample_size: u64, bytes: u64) {
        self.emit(ProgressEvent::new(
            "sample",
            sampled,
            Some(sample_size),
            format!("{} compressed bytes sampled", bytes),
        ));
    }

    /// Records ingested; percentage is of the archive's bytes consumed.
    pub fn ingest(&self, items: u64, bytes_consumed: u64, file_size: u64) {
        let pct = if file_size > 0 {
            bytes_consumed as f64 / file_size as f64 * 100.0
        } else {
            0.0
        };
        self.emit(
            ProgressEvent::new("ingest", items, None, format!("processed {} items", items))
                .with_percentage(pct),
        );
    }

    /// Chunk handed to the LLM.
    pub fn analyze(&self, kind: ArchiveKind, chunk: usize, total_chunks: usize) {
        self.emit(ProgressEvent::new(
            "analyze",
            chunk as u64,
            Some(total_chunks as u64),
            format!("{} chunk {}", kind, chunk),
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_event_format() {
        let event = ProgressEvent::new("analyze", 2, Some(4), "comments chunk 2");
        let formatted = event.format_simple();
        assert_eq!(formatted, "[analyze] 2/4 (50.00%) - comments chunk 2");
    }

    #[test]
    fn test_ingest_percentage_uses_bytes() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::new(Arc::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        reporter.ingest(10_000, 250, 1000);
        reporter.ingest(20_000, 10, 0);

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].phase, "ingest");
        assert_eq!(captured[0].percentage, Some(25.0));
        assert_eq!(captured[1].percentage, Some(0.0));
        assert!(captured[0].elapsed_secs.is_some());
    }

    #[test]
    fn test_noop_reporter() {
        let reporter = ProgressReporter::noop();
        reporter.count(50_000);
    }
}
