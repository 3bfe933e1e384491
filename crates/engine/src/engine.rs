//! The log engine contract and its JSON-lines implementation.

use crate::error::EngineResult;
use crate::level::Level;
use crate::metrics::EngineMetrics;
use crate::options::EngineOptions;
use crate::record::{build_record, to_line, Fields};
use crate::redact::Redactor;
use crate::sink::Output;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Completion callback handed to [`LogEngine::flush`].
pub type FlushCallback = Box<dyn FnOnce(EngineResult<()>) + Send + 'static>;

/// A structured log engine.
///
/// This trait is the only surface the facade depends on, so engines can be
/// swapped (JSON lines, `tracing`, or a test double) without touching callers.
pub trait LogEngine: Send + Sync {
    /// Resolved configuration this engine was built with.
    fn options(&self) -> &EngineOptions;

    /// Fields attached to every record of this engine.
    fn bindings(&self) -> &Fields;

    /// Whether a record at `level` would be written.
    fn is_enabled(&self, level: Level) -> bool {
        self.options().level.allows(level)
    }

    /// Serialize and write one record. Records below the level filter are
    /// dropped silently.
    fn emit(&self, level: Level, fields: Fields, message: &str) -> EngineResult<()>;

    /// Derive an engine that adds `bindings` to every record.
    fn child(&self, bindings: Fields) -> Arc<dyn LogEngine>;

    /// Invoke `on_complete` once every record emitted so far is written.
    fn flush(&self, on_complete: FlushCallback);

    /// Engine metrics, if the engine collects any.
    fn metrics(&self) -> Option<&EngineMetrics> {
        None
    }
}

struct Shared {
    options: EngineOptions,
    redactor: Redactor,
    output: Output,
    metrics: EngineMetrics,
}

/// Engine writing one JSON object per line to a [`Destination`](crate::sink::Destination).
#[derive(Clone)]
pub struct JsonEngine {
    shared: Arc<Shared>,
    bindings: Fields,
}

impl JsonEngine {
    /// Create an engine, opening its destination.
    ///
    /// # Arguments
    /// * `options` - Resolved engine configuration
    pub fn new(options: EngineOptions) -> EngineResult<Self> {
        let metrics = EngineMetrics::new()?;
        let output = Output::open(&options.destination, options.buffered, metrics.clone())?;
        let redactor = Redactor::new(&options.redact);

        debug!(
            level = %options.level,
            destination = ?options.destination,
            buffered = options.buffered,
            "Constructed JSON log engine"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                options,
                redactor,
                output,
                metrics,
            }),
            bindings: Fields::new(),
        })
    }
}

impl LogEngine for JsonEngine {
    fn options(&self) -> &EngineOptions {
        &self.shared.options
    }

    fn bindings(&self) -> &Fields {
        &self.bindings
    }

    fn emit(&self, level: Level, fields: Fields, message: &str) -> EngineResult<()> {
        if !self.is_enabled(level) {
            return Ok(());
        }

        let shared = &self.shared;
        let mut record = build_record(&shared.options, &self.bindings, level, fields, message, Utc::now());

        let redacted = shared.redactor.apply(&mut record);
        if redacted > 0 {
            shared.metrics.inc_redacted_fields(redacted as u64);
        }

        let line = to_line(&record)?;
        if let Err(e) = shared.output.write_line(line) {
            shared.metrics.inc_write_errors();
            return Err(e);
        }
        shared.metrics.inc_records(level);
        Ok(())
    }

    fn child(&self, bindings: Fields) -> Arc<dyn LogEngine> {
        let mut merged = self.bindings.clone();
        merged.extend(bindings);
        Arc::new(Self {
            shared: Arc::clone(&self.shared),
            bindings: merged,
        })
    }

    fn flush(&self, on_complete: FlushCallback) {
        self.shared.output.flush(on_complete);
    }

    fn metrics(&self) -> Option<&EngineMetrics> {
        Some(&self.shared.metrics)
    }
}
