//! Field redaction applied to every record before it is written.
//!
//! A path without dots (`password`) matches that key at any depth of the
//! record, including inside arrays of objects. A dotted path
//! (`req.headers.cookie`) is matched from the record root, and a `*` segment
//! matches every key at that position.

use crate::record::Fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names removed from records when no redaction is configured.
pub const DEFAULT_REDACT_PATHS: [&str; 4] = ["password", "token", "authorization", "secret"];

/// Replacement value used when `remove` is false.
pub const DEFAULT_CENSOR: &str = "[Redacted]";

/// Redaction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redaction {
    /// Field paths to redact.
    pub paths: Vec<String>,
    /// Remove matching fields instead of replacing their value.
    #[serde(default)]
    pub remove: bool,
    /// Replacement value when `remove` is false.
    #[serde(default = "default_censor")]
    pub censor: String,
}

fn default_censor() -> String {
    DEFAULT_CENSOR.to_string()
}

impl Redaction {
    /// Redaction that removes the given paths.
    pub fn remove<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            remove: true,
            censor: default_censor(),
        }
    }

    /// Redaction that replaces the given paths with `censor`.
    pub fn censor<I, S>(paths: I, censor: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            remove: false,
            censor: censor.into(),
        }
    }

    /// Redaction that leaves records untouched.
    pub fn none() -> Self {
        Self::remove(Vec::<String>::new())
    }
}

impl Default for Redaction {
    fn default() -> Self {
        Self::remove(DEFAULT_REDACT_PATHS)
    }
}

/// Compiled form of a [`Redaction`], built once per engine.
#[derive(Debug, Clone)]
pub(crate) struct Redactor {
    anywhere: Vec<String>,
    rooted: Vec<Vec<String>>,
    remove: bool,
    censor: Value,
}

impl Redactor {
    pub(crate) fn new(redaction: &Redaction) -> Self {
        let mut anywhere = Vec::new();
        let mut rooted = Vec::new();
        for path in redaction.paths.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            if path.contains('.') {
                rooted.push(path.split('.').map(str::to_string).collect());
            } else {
                anywhere.push(path.to_string());
            }
        }

        Self {
            anywhere,
            rooted,
            remove: redaction.remove,
            censor: Value::String(redaction.censor.clone()),
        }
    }

    /// Redact `record` in place, returning how many fields were touched.
    pub(crate) fn apply(&self, record: &mut Fields) -> usize {
        let mut count = 0;
        for key in &self.anywhere {
            count += self.scrub_everywhere(record, key);
        }
        for segments in &self.rooted {
            count += self.scrub_path(record, segments);
        }
        count
    }

    fn scrub_key(&self, map: &mut Fields, key: &str) -> usize {
        if key == "*" {
            return self.scrub_all(map);
        }

        if self.remove {
            let before = map.len();
            map.retain(|k, _| k != key);
            before - map.len()
        } else if let Some(value) = map.get_mut(key) {
            *value = self.censor.clone();
            1
        } else {
            0
        }
    }

    fn scrub_all(&self, map: &mut Fields) -> usize {
        let count = map.len();
        if self.remove {
            map.clear();
        } else {
            for value in map.values_mut() {
                *value = self.censor.clone();
            }
        }
        count
    }

    fn scrub_everywhere(&self, map: &mut Fields, key: &str) -> usize {
        let mut count = self.scrub_key(map, key);
        for value in map.values_mut() {
            count += self.scrub_nested(value, key);
        }
        count
    }

    fn scrub_nested(&self, value: &mut Value, key: &str) -> usize {
        match value {
            Value::Object(map) => self.scrub_everywhere(map, key),
            Value::Array(items) => items.iter_mut().map(|v| self.scrub_nested(v, key)).sum(),
            _ => 0,
        }
    }

    fn scrub_path(&self, map: &mut Fields, segments: &[String]) -> usize {
        match segments {
            [] => 0,
            [last] => self.scrub_key(map, last),
            [head, rest @ ..] => {
                if head == "*" {
                    map.values_mut()
                        .filter_map(Value::as_object_mut)
                        .map(|m| self.scrub_path(m, rest))
                        .sum()
                } else {
                    match map.get_mut(head.as_str()).and_then(Value::as_object_mut) {
                        Some(m) => self.scrub_path(m, rest),
                        None => 0,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_default_removes_sensitive_keys_at_any_depth() {
        let redactor = Redactor::new(&Redaction::default());
        let mut record = fields(json!({
            "user": "ada",
            "password": "hunter2",
            "headers": { "authorization": "Bearer x", "accept": "*/*" },
            "sessions": [{ "token": "abc", "id": 1 }]
        }));

        let count = redactor.apply(&mut record);

        assert_eq!(count, 3);
        assert_eq!(
            Value::Object(record),
            json!({
                "user": "ada",
                "headers": { "accept": "*/*" },
                "sessions": [{ "id": 1 }]
            })
        );
    }

    #[test]
    fn test_removal_keeps_field_order() {
        let redactor = Redactor::new(&Redaction::default());
        let mut record = fields(json!({ "a": 1, "secret": 2, "b": 3, "c": 4 }));
        redactor.apply(&mut record);
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dotted_path_only_matches_from_root() {
        let redactor = Redactor::new(&Redaction::remove(["req.headers.cookie"]));
        let mut record = fields(json!({
            "req": { "headers": { "cookie": "c", "host": "h" } },
            "cookie": "kept"
        }));

        assert_eq!(redactor.apply(&mut record), 1);
        assert_eq!(record["req"], json!({ "headers": { "host": "h" } }));
        assert_eq!(record["cookie"], "kept");
    }

    #[test]
    fn test_wildcard_segment() {
        let redactor = Redactor::new(&Redaction::remove(["*.card"]));
        let mut record = fields(json!({
            "a": { "card": 1, "x": 1 },
            "b": { "card": 2 },
            "card": 3
        }));

        assert_eq!(redactor.apply(&mut record), 2);
        assert_eq!(record["card"], 3);
        assert_eq!(record["a"], json!({ "x": 1 }));
    }

    #[test]
    fn test_trailing_wildcard_with_literal_star_key() {
        let removing = Redactor::new(&Redaction::remove(["a.*"]));
        let mut record = fields(json!({ "a": { "*": 1, "b": 2 }, "c": 3 }));

        assert_eq!(removing.apply(&mut record), 2);
        assert_eq!(Value::Object(record), json!({ "a": {}, "c": 3 }));

        let censoring = Redactor::new(&Redaction::censor(["*"], "x"));
        let mut record = fields(json!({ "*": 1, "b": { "*": 2 } }));

        assert_eq!(censoring.apply(&mut record), 2);
        assert_eq!(Value::Object(record), json!({ "*": "x", "b": "x" }));
    }

    #[test]
    fn test_censor_replaces_value() {
        let redactor = Redactor::new(&Redaction::censor(["token"], "***"));
        let mut record = fields(json!({ "token": "abc", "nested": { "token": "def" } }));

        assert_eq!(redactor.apply(&mut record), 2);
        assert_eq!(record["token"], "***");
        assert_eq!(record["nested"]["token"], "***");
    }

    #[test]
    fn test_empty_redaction_is_noop() {
        let redactor = Redactor::new(&Redaction::none());
        let mut record = fields(json!({ "password": "p" }));
        assert_eq!(redactor.apply(&mut record), 0);
        assert_eq!(record["password"], "p");
    }

    #[test]
    fn test_deserialize_defaults() {
        let redaction: Redaction = serde_json::from_value(json!({ "paths": ["pin"] })).unwrap();
        assert!(!redaction.remove);
        assert_eq!(redaction.censor, DEFAULT_CENSOR);
    }
}
