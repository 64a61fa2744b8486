//! Subpulse Core Library
//!
//! This crate provides the foundational utilities shared by every Subpulse crate:
//! - Error handling (`AppError`, `AppResult`, `ErrorKind`)
//! - Logging infrastructure
//! - Layered configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AnalysisSettings, AppConfig, EstimationSettings};
pub use error::{AppError, AppResult, ErrorKind};
