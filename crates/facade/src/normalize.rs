//! Normalization of arbitrary error values.
//!
//! Anything handed to [`LogFacade::error`](crate::LogFacade::error) or
//! [`LogFacade::fatal`](crate::LogFacade::fatal) is first classified into an
//! [`ErrorInput`], then turned into a [`NormalizedError`] by [`ensure_error`]
//! and flattened for output by [`format_error`]. `ensure_error` is total: it
//! never fails and never panics.

use crate::context::LogContext;
use serde_json::Value;
use std::any::type_name;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;
use std::iter::successors;

/// Keys written by [`format_error`] itself. Extra fields with these names
/// are not copied.
pub const RESERVED_ERROR_KEYS: [&str; 3] = ["type", "message", "stackTrace"];

const DEFAULT_KIND: &str = "Error";
const EMPTY_MESSAGE: &str = "Unknown error";

/// Canonical error value.
///
/// `message` and `stack_trace` are never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    kind: String,
    message: String,
    stack_trace: String,
    extra_fields: LogContext,
}

impl NormalizedError {
    /// Error of kind `Error` with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(DEFAULT_KIND, message)
    }

    pub fn with_kind(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let kind = non_empty(kind.into(), DEFAULT_KIND);
        let message = non_empty(message.into(), EMPTY_MESSAGE);
        let stack_trace = render_stack(&kind, &message, &[], None);
        Self {
            kind,
            message,
            stack_trace,
            extra_fields: LogContext::new(),
        }
    }

    /// Capture a native error, its source chain and, when enabled through
    /// `RUST_BACKTRACE`, a backtrace.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        let kind = non_empty(short_type_name(type_name::<E>()), DEFAULT_KIND);
        let message = non_empty(error.to_string(), EMPTY_MESSAGE);
        let causes: Vec<String> = successors(error.source(), |&e| e.source())
            .map(|e| e.to_string())
            .collect();
        let backtrace = Backtrace::capture();
        let stack_trace = render_stack(&kind, &message, &causes, Some(&backtrace));

        Self {
            kind,
            message,
            stack_trace,
            extra_fields: LogContext::new(),
        }
    }

    /// Attach a diagnostic field, e.g. an error code.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_fields.insert(key.into(), value.into());
        self
    }

    /// Replace the stack trace. Empty traces are ignored.
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        let stack_trace = stack_trace.into();
        if !stack_trace.is_empty() {
            self.stack_trace = stack_trace;
        }
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_trace(&self) -> &str {
        &self.stack_trace
    }

    pub fn extra_fields(&self) -> &LogContext {
        &self.extra_fields
    }
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for NormalizedError {}

/// Any value that can be logged as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorInput {
    /// Already an error value.
    Error(NormalizedError),
    /// Plain text.
    Text(String),
    /// A record with a string `message` field.
    RecordWithMessage(LogContext),
    /// Any other record.
    Record(LogContext),
    /// Numbers, booleans, null, arrays.
    Other(Value),
}

impl ErrorInput {
    pub fn from_error<E>(error: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        ErrorInput::Error(NormalizedError::from_error(error))
    }
}

impl From<Value> for ErrorInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => ErrorInput::Text(text),
            Value::Object(record) => {
                if record.get("message").is_some_and(Value::is_string) {
                    ErrorInput::RecordWithMessage(record)
                } else {
                    ErrorInput::Record(record)
                }
            }
            other => ErrorInput::Other(other),
        }
    }
}

impl From<LogContext> for ErrorInput {
    fn from(record: LogContext) -> Self {
        Value::Object(record).into()
    }
}

impl From<&str> for ErrorInput {
    fn from(text: &str) -> Self {
        ErrorInput::Text(text.to_string())
    }
}

impl From<String> for ErrorInput {
    fn from(text: String) -> Self {
        ErrorInput::Text(text)
    }
}

impl From<NormalizedError> for ErrorInput {
    fn from(error: NormalizedError) -> Self {
        ErrorInput::Error(error)
    }
}

impl From<std::io::Error> for ErrorInput {
    fn from(error: std::io::Error) -> Self {
        let kind = format!("{:?}", error.kind());
        ErrorInput::Error(NormalizedError::from_error(&error).field("code", kind))
    }
}

impl From<Box<dyn StdError + Send + Sync>> for ErrorInput {
    fn from(error: Box<dyn StdError + Send + Sync>) -> Self {
        ErrorInput::from_error(&*error)
    }
}

impl From<anyhow::Error> for ErrorInput {
    fn from(error: anyhow::Error) -> Self {
        let message = non_empty(error.to_string(), EMPTY_MESSAGE);
        let causes: Vec<String> = error.chain().skip(1).map(|e| e.to_string()).collect();
        let stack_trace = render_stack(DEFAULT_KIND, &message, &causes, Some(error.backtrace()));

        ErrorInput::Error(NormalizedError {
            kind: DEFAULT_KIND.to_string(),
            message,
            stack_trace,
            extra_fields: LogContext::new(),
        })
    }
}

/// Turn any input into a canonical error.
///
/// - errors pass through unchanged
/// - text becomes the message
/// - a record with a string `message` keeps its other fields as extra
///   fields; a string `type` (or else `name`) sets the kind and a string
///   `stack` the stack trace. When both are present `name` stays an extra
///   field
/// - other records are rendered as compact JSON
/// - anything else uses its string form
pub fn ensure_error(input: impl Into<ErrorInput>) -> NormalizedError {
    match input.into() {
        ErrorInput::Error(error) => error,
        ErrorInput::Text(text) => NormalizedError::new(text),
        ErrorInput::RecordWithMessage(mut record) => {
            let message = take_string(&mut record, "message").unwrap_or_default();
            let kind = take_string(&mut record, "type")
                .or_else(|| take_string(&mut record, "name"))
                .unwrap_or_else(|| DEFAULT_KIND.to_string());
            let stack = take_string(&mut record, "stack");

            let mut error = NormalizedError::with_kind(kind, message);
            if let Some(stack) = stack {
                error = error.with_stack_trace(stack);
            }
            error.extra_fields = record;
            error
        }
        ErrorInput::Record(record) => NormalizedError::new(Value::Object(record).to_string()),
        ErrorInput::Other(Value::String(text)) => NormalizedError::new(text),
        ErrorInput::Other(value) => NormalizedError::new(value.to_string()),
    }
}

/// Flatten an error into the fields logged under `error`.
pub fn format_error(error: &NormalizedError) -> LogContext {
    let mut fields = LogContext::new();
    fields.insert("type".to_string(), Value::String(error.kind.clone()));
    fields.insert("message".to_string(), Value::String(error.message.clone()));
    fields.insert("stackTrace".to_string(), Value::String(error.stack_trace.clone()));

    for (key, value) in &error.extra_fields {
        if !RESERVED_ERROR_KEYS.contains(&key.as_str()) {
            fields.insert(key.clone(), value.clone());
        }
    }
    fields
}

fn take_string(record: &mut LogContext, key: &str) -> Option<String> {
    match record.get(key) {
        Some(Value::String(_)) => {}
        _ => return None,
    }
    let mut taken = None;
    record.retain(|k, v| {
        if k == key {
            taken = v.as_str().map(str::to_string);
            false
        } else {
            true
        }
    });
    taken
}

fn non_empty(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// `std::io::error::Error` -> `Error`, `dyn core::error::Error + Send` -> `Error`.
fn short_type_name(full: &str) -> String {
    let full = full.trim_start_matches("dyn ");
    let base = full.split(['<', ' ']).next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn render_stack(kind: &str, message: &str, causes: &[String], backtrace: Option<&Backtrace>) -> String {
    let mut stack = format!("{}: {}", kind, message);
    for cause in causes {
        stack.push_str("\ncaused by: ");
        stack.push_str(cause);
    }
    if let Some(backtrace) = backtrace.filter(|b| b.status() == BacktraceStatus::Captured) {
        stack.push('\n');
        stack.push_str(&backtrace.to_string());
    }
    stack
}
