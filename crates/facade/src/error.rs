//! Error type for facade operations.

use logfacade_engine::EngineError;

/// Error type for facade operations.
///
/// Engine failures pass through unchanged; the facade never recovers from
/// them locally.
#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    #[error("Log engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Log engine dropped the flush callback without completing it")]
    FlushAbandoned,
}

/// Result type for facade operations.
pub type FacadeResult<T> = Result<T, FacadeError>;
