//! Engine configuration.
//!
//! [`EngineOptions`] is the fully resolved configuration an engine is built
//! from. [`LoggerOptions`] carries caller overrides; merging replaces whole
//! top-level fields and never merges nested values.

use crate::level::{Level, LevelFilter};
use crate::record::Fields;
use crate::redact::Redaction;
use crate::sink::Destination;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the `level` field of a record is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelFormat {
    /// `"INFO"`
    #[default]
    UpperLabel,
    /// `"info"`
    Label,
    /// `30`
    Number,
}

impl LevelFormat {
    pub fn render(self, level: Level) -> Value {
        match self {
            LevelFormat::UpperLabel => Value::String(level.as_str().to_ascii_uppercase()),
            LevelFormat::Label => Value::String(level.as_str().to_string()),
            LevelFormat::Number => Value::from(level.as_number()),
        }
    }
}

/// How the `time` field of a record is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// ISO-8601 with millisecond precision, e.g. `"2026-10-18T09:30:00.000Z"`.
    #[default]
    Iso,
    /// Milliseconds since the Unix epoch.
    Epoch,
    /// Whole seconds since the Unix epoch.
    Unix,
    /// No `time` field.
    None,
}

impl TimestampFormat {
    pub fn render(self, now: DateTime<Utc>) -> Option<Value> {
        match self {
            TimestampFormat::Iso => Some(Value::String(
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            TimestampFormat::Epoch => Some(Value::from(now.timestamp_millis())),
            TimestampFormat::Unix => Some(Value::from(now.timestamp())),
            TimestampFormat::None => None,
        }
    }
}

/// Resolved engine configuration.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Minimum level written.
    pub level: LevelFilter,
    /// Optional logger name, written as `name`.
    pub name: Option<String>,
    /// Key under which the message is written. Defaults to `msg`, as pino
    /// does, rather than `message`.
    pub message_key: String,
    /// Fields written on every record after `level`/`time`.
    pub base: Fields,
    pub level_format: LevelFormat,
    pub timestamp: TimestampFormat,
    pub redact: Redaction,
    pub destination: Destination,
    /// Hand writes to a background thread instead of writing inline.
    pub buffered: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            name: None,
            message_key: "msg".to_string(),
            base: default_base(),
            level_format: LevelFormat::UpperLabel,
            timestamp: TimestampFormat::Iso,
            redact: Redaction::default(),
            destination: Destination::Stdout,
            buffered: false,
        }
    }
}

impl EngineOptions {
    /// Apply caller overrides field by field.
    pub fn merge(mut self, overrides: LoggerOptions) -> Self {
        let LoggerOptions {
            level,
            name,
            message_key,
            base,
            level_format,
            timestamp,
            redact,
            destination,
            buffered,
        } = overrides;

        if let Some(level) = level {
            self.level = level;
        }
        if name.is_some() {
            self.name = name;
        }
        if let Some(message_key) = message_key {
            self.message_key = message_key;
        }
        if let Some(base) = base {
            self.base = base;
        }
        if let Some(level_format) = level_format {
            self.level_format = level_format;
        }
        if let Some(timestamp) = timestamp {
            self.timestamp = timestamp;
        }
        if let Some(redact) = redact {
            self.redact = redact;
        }
        if let Some(destination) = destination {
            self.destination = destination;
        }
        if let Some(buffered) = buffered {
            self.buffered = buffered;
        }
        self
    }
}

/// Caller-supplied overrides for [`EngineOptions`].
///
/// Every field left as `None` keeps the default. Deserializes from any serde
/// format, e.g. `{"level": "debug", "destination": {"file": "app.log"}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerOptions {
    pub level: Option<LevelFilter>,
    pub name: Option<String>,
    /// Overrides the record message key (`msg` by default). Set it to
    /// `"message"` to write the message under `message`.
    pub message_key: Option<String>,
    /// Replaces the default `pid`/`hostname` fields. An empty map disables them.
    pub base: Option<Fields>,
    pub level_format: Option<LevelFormat>,
    pub timestamp: Option<TimestampFormat>,
    /// Replaces the default redaction entirely.
    pub redact: Option<Redaction>,
    pub destination: Option<Destination>,
    pub buffered: Option<bool>,
}

impl LoggerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: impl Into<LevelFilter>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_redact(mut self, redact: Redaction) -> Self {
        self.redact = Some(redact);
        self
    }

    pub fn with_buffered(mut self, buffered: bool) -> Self {
        self.buffered = Some(buffered);
        self
    }
}

fn default_base() -> Fields {
    let mut base = Fields::new();
    base.insert("pid".to_string(), Value::from(std::process::id()));
    base.insert("hostname".to_string(), Value::String(hostname()));
    base
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redact::DEFAULT_REDACT_PATHS;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.level, LevelFilter::Info);
        assert_eq!(options.level_format, LevelFormat::UpperLabel);
        assert_eq!(options.timestamp, TimestampFormat::Iso);
        assert_eq!(options.redact.paths, DEFAULT_REDACT_PATHS);
        assert!(options.redact.remove);
        assert!(options.base.contains_key("pid"));
        assert!(options.base.contains_key("hostname"));
    }

    #[test]
    fn test_merge_replaces_top_level_fields_only() {
        let options = EngineOptions::default().merge(
            LoggerOptions::new()
                .with_level(Level::Debug)
                .with_redact(Redaction::remove(["pin"])),
        );

        assert_eq!(options.level, LevelFilter::Debug);
        assert_eq!(options.redact.paths, vec!["pin".to_string()]);
        // untouched fields keep their defaults
        assert_eq!(options.level_format, LevelFormat::UpperLabel);
        assert_eq!(options.message_key, "msg");
    }

    #[test]
    fn test_logger_options_from_json() {
        let overrides: LoggerOptions = serde_json::from_value(json!({
            "level": "trace",
            "destination": { "file": "/tmp/app.log" },
            "timestamp": "epoch",
            "base": {}
        }))
        .unwrap();

        let options = EngineOptions::default().merge(overrides);
        assert_eq!(options.level, LevelFilter::Trace);
        assert_eq!(options.timestamp, TimestampFormat::Epoch);
        assert!(options.base.is_empty());
        assert!(matches!(options.destination, Destination::File(_)));
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let result = serde_json::from_value::<LoggerOptions>(json!({ "transport": "pretty" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_render_formats() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        assert_eq!(
            TimestampFormat::Iso.render(now),
            Some(json!("2026-10-18T09:30:00.000Z"))
        );
        assert_eq!(TimestampFormat::Unix.render(now), Some(json!(now.timestamp())));
        assert_eq!(TimestampFormat::None.render(now), None);
        assert_eq!(LevelFormat::UpperLabel.render(Level::Warn), json!("WARN"));
        assert_eq!(LevelFormat::Number.render(Level::Warn), json!(40));
    }
}
