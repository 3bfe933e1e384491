//! Structured JSON-lines log engine.
//!
//! The engine renders pino-compatible records (`level`, `time`, `pid`,
//! `hostname`, bindings, fields, `msg`), removes sensitive fields, and writes
//! them to a destination either inline or through a background writer.
//! Callers program against the [`LogEngine`] trait.

pub mod engine;
pub mod error;
pub mod level;
pub mod logging;
pub mod metrics;
pub mod options;
pub mod record;
pub mod redact;
pub mod sink;
pub mod tracing_engine;

pub use engine::{FlushCallback, JsonEngine, LogEngine};
pub use error::{EngineError, EngineResult};
pub use level::{Level, LevelFilter};
pub use logging::init_logging;
pub use metrics::EngineMetrics;
pub use options::{EngineOptions, LevelFormat, LoggerOptions, TimestampFormat};
pub use record::Fields;
pub use redact::Redaction;
pub use sink::{Destination, MemorySink};
pub use tracing_engine::TracingEngine;
