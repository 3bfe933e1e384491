//! Record assembly.

use crate::level::Level;
use crate::options::EngineOptions;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Structured fields of a record, in insertion order.
pub type Fields = Map<String, Value>;

/// Build the record for one log call.
///
/// Field order is `level`, `time`, base fields, `name`, bindings, call
/// fields, then the message. Later fields overwrite earlier ones with the
/// same key.
pub(crate) fn build_record(
    options: &EngineOptions,
    bindings: &Fields,
    level: Level,
    fields: Fields,
    message: &str,
    now: DateTime<Utc>,
) -> Fields {
    let mut record = Fields::with_capacity(4 + options.base.len() + bindings.len() + fields.len());

    record.insert("level".to_string(), options.level_format.render(level));
    if let Some(time) = options.timestamp.render(now) {
        record.insert("time".to_string(), time);
    }
    for (key, value) in &options.base {
        record.insert(key.clone(), value.clone());
    }
    if let Some(name) = &options.name {
        record.insert("name".to_string(), Value::String(name.clone()));
    }
    for (key, value) in bindings {
        record.insert(key.clone(), value.clone());
    }
    record.extend(fields);
    record.insert(options.message_key.clone(), Value::String(message.to_string()));

    record
}

/// Serialize a record as one JSON line.
pub(crate) fn to_line(record: &Fields) -> serde_json::Result<Vec<u8>> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    Ok(line)
}
