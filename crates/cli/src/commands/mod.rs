//! Command handlers for the Subpulse CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod analyze;
pub mod batch;
pub mod check;

// Re-export command types for convenience
pub use analyze::AnalyzeCommand;
pub use batch::BatchCommand;
pub use check::CheckCommand;

use std::sync::Arc;
use subpulse_analysis::ProgressReporter;

/// Reporter printing one line per progress event to stderr.
pub(crate) fn stderr_progress() -> ProgressReporter {
    ProgressReporter::new(Arc::new(|event| {
        eprintln!("{}", event.format_simple());
    }))
}
