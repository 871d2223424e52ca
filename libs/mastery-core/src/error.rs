//! Error types for mastery-core.

use thiserror::Error;

/// Result type alias using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the scheduler and by homophone table loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("mastery threshold must be at least 1, got {0}")]
    InvalidThreshold(u32),

    #[error("no active session: {0}")]
    SessionNotActive(&'static str),

    #[error("homophone group at line {line} needs at least two distinct words")]
    InvalidHomophoneGroup { line: usize },

    #[error("empty word in homophone group at line {line}")]
    EmptyHomophoneWord { line: usize },
}
