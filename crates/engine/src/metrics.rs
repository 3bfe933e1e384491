//! Prometheus metrics for a log engine.
//!
//! Each engine owns its own registry so several engines (and tests) can
//! coexist in one process. Child engines share their parent's metrics.

use crate::error::EngineResult;
use crate::level::Level;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Metrics collector for one log engine.
#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    records: IntCounterVec,
    redacted_fields: IntCounter,
    write_errors: IntCounter,
}

impl EngineMetrics {
    /// Create a new metrics instance with a private registry.
    pub fn new() -> EngineResult<Self> {
        let registry = Registry::new();

        let records = IntCounterVec::new(
            Opts::new("logfacade_records_total", "Total number of log records written"),
            &["level"],
        )?;
        registry.register(Box::new(records.clone()))?;

        let redacted_fields = IntCounter::new(
            "logfacade_redacted_fields_total",
            "Total number of fields removed or censored by redaction",
        )?;
        registry.register(Box::new(redacted_fields.clone()))?;

        let write_errors = IntCounter::new(
            "logfacade_write_errors_total",
            "Total number of failed writes to the log destination",
        )?;
        registry.register(Box::new(write_errors.clone()))?;

        Ok(Self {
            registry,
            records,
            redacted_fields,
            write_errors,
        })
    }

    /// Increment the records counter for a level.
    pub fn inc_records(&self, level: Level) {
        self.records.with_label_values(&[level.as_str()]).inc();
    }

    /// Add to the redacted fields counter.
    pub fn inc_redacted_fields(&self, count: u64) {
        self.redacted_fields.inc_by(count);
    }

    /// Increment the write errors counter.
    pub fn inc_write_errors(&self) {
        self.write_errors.inc();
    }

    pub fn records(&self, level: Level) -> u64 {
        self.records.with_label_values(&[level.as_str()]).get()
    }

    pub fn redacted_fields(&self) -> u64 {
        self.redacted_fields.get()
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors.get()
    }

    /// Get the metrics in the Prometheus text format.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engines_have_independent_registries() {
        let first = EngineMetrics::new().unwrap();
        let second = EngineMetrics::new().unwrap();

        first.inc_records(Level::Info);
        first.inc_records(Level::Info);
        first.inc_redacted_fields(3);

        assert_eq!(first.records(Level::Info), 2);
        assert_eq!(first.redacted_fields(), 3);
        assert_eq!(second.records(Level::Info), 0);
    }

    #[test]
    fn test_gather_renders_text_format() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.inc_records(Level::Warn);
        metrics.inc_write_errors();

        let text = metrics.gather().unwrap();
        assert!(text.contains("logfacade_records_total{level=\"warn\"} 1"));
        assert!(text.contains("logfacade_write_errors_total 1"));
    }
}
