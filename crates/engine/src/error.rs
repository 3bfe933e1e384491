//! Error type for log engine operations.

use std::io;

/// Error type for log engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error on log destination: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to register engine metrics: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("Log writer is closed")]
    WriterClosed,
    #[error("Background log writer failed: {0}")]
    Writer(String),
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
}

/// Result type for log engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
