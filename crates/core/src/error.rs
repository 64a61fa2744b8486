//! Error types for Subpulse.
//!
//! This module defines a unified error enum covering configuration, archive
//! reading, record parsing, LLM requests, prompt rendering and output
//! persistence. Each variant maps to an [`ErrorKind`] which decides whether a
//! failure aborts the run or is absorbed by the stage that hit it.

use thiserror::Error;

/// Unified error type for Subpulse.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors, including a missing credential
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive could not be opened or decoded
    #[error("Archive error: {0}")]
    Archive(String),

    /// A single record could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// LLM transport or protocol errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// LLM service answered with a non-success status
    #[error("LLM API error ({status}): {message}")]
    LlmStatus { status: u16, message: String },

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Propagation class of an [`AppError`].
///
/// Only `FatalConfig` is allowed to abort a run. Every other kind is logged
/// and absorbed at the granularity where it happened (archive, chunk, item or
/// artifact).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FatalConfig,
    RecoverableArchive,
    RecoverableRequest,
    RecoverableParse,
    RecoverableOutput,
}

impl ErrorKind {
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::FatalConfig)
    }
}

impl AppError {
    /// Classify this error for propagation decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) | AppError::Prompt(_) => ErrorKind::FatalConfig,
            AppError::Archive(_) => ErrorKind::RecoverableArchive,
            AppError::Llm(_) | AppError::LlmStatus { .. } => ErrorKind::RecoverableRequest,
            AppError::Parse(_) => ErrorKind::RecoverableParse,
            AppError::Io(_) | AppError::Serialization(_) | AppError::Other(_) => {
                ErrorKind::RecoverableOutput
            }
        }
    }

    /// Status code of an LLM API failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::LlmStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_is_fatal() {
        assert!(AppError::Config("missing key".into()).kind().is_fatal());
        assert!(!AppError::Llm("timeout".into()).kind().is_fatal());
        assert!(!AppError::Parse("bad line".into()).kind().is_fatal());
        assert!(!AppError::Archive("truncated".into()).kind().is_fatal());
    }

    #[test]
    fn test_status_kind() {
        let err = AppError::LlmStatus {
            status: 429,
            message: "slow down".into(),
        };
        assert_eq!(err.kind(), ErrorKind::RecoverableRequest);
        assert_eq!(err.status(), Some(429));
        assert_eq!(AppError::Llm("x".into()).status(), None);
        assert_eq!(err.to_string(), "LLM API error (429): slow down");
    }
}
