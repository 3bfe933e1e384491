//! Engine that forwards records into `tracing`.
//!
//! Useful when the host already runs a `tracing` subscriber: each record
//! becomes one event with target `logfacade`, the redacted structured fields
//! serialized into a `record` field, and the message as the event message.
//! `tracing` has no fatal level, so fatal records are emitted at `ERROR`
//! with `fatal = true`.

use crate::engine::{FlushCallback, LogEngine};
use crate::error::EngineResult;
use crate::level::Level;
use crate::metrics::EngineMetrics;
use crate::options::EngineOptions;
use crate::record::Fields;
use crate::redact::Redactor;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

struct Shared {
    options: EngineOptions,
    redactor: Redactor,
    metrics: EngineMetrics,
}

#[derive(Clone)]
pub struct TracingEngine {
    shared: Arc<Shared>,
    bindings: Fields,
}

impl TracingEngine {
    /// Create an engine. The destination and formatting options are ignored;
    /// the active subscriber decides those.
    pub fn new(options: EngineOptions) -> EngineResult<Self> {
        let redactor = Redactor::new(&options.redact);
        let mut bindings = Fields::new();
        if let Some(name) = &options.name {
            bindings.insert("name".to_string(), name.clone().into());
        }

        Ok(Self {
            shared: Arc::new(Shared {
                options,
                redactor,
                metrics: EngineMetrics::new()?,
            }),
            bindings,
        })
    }
}

impl LogEngine for TracingEngine {
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

        let mut record = self.bindings.clone();
        record.extend(fields);
        let redacted = self.shared.redactor.apply(&mut record);
        if redacted > 0 {
            self.shared.metrics.inc_redacted_fields(redacted as u64);
        }
        let record = serde_json::to_string(&record)?;

        match level {
            Level::Trace => trace!(target: "logfacade", record = %record, "{}", message),
            Level::Debug => debug!(target: "logfacade", record = %record, "{}", message),
            Level::Info => info!(target: "logfacade", record = %record, "{}", message),
            Level::Warn => warn!(target: "logfacade", record = %record, "{}", message),
            Level::Error => error!(target: "logfacade", record = %record, "{}", message),
            Level::Fatal => error!(target: "logfacade", fatal = true, record = %record, "{}", message),
        }
        self.shared.metrics.inc_records(level);
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

    /// Subscribers write synchronously, so there is nothing to wait for.
    fn flush(&self, on_complete: FlushCallback) {
        on_complete(Ok(()));
    }

    fn metrics(&self) -> Option<&EngineMetrics> {
        Some(&self.shared.metrics)
    }
}
