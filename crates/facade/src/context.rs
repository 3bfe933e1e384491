//! Global log context.

use logfacade_engine::Fields;
use serde_json::Value;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Structured fields attached to log records.
pub type LogContext = Fields;

/// Merge call-site fields over global fields. Call-site keys win.
pub fn merge_context(global: &LogContext, call: Option<LogContext>) -> LogContext {
    let mut merged = global.clone();
    if let Some(call) = call {
        merged.extend(call);
    }
    merged
}

/// Convert a JSON value into a context. Objects are used as-is; any other
/// value is stored under `value`.
pub fn to_context(value: Value) -> LogContext {
    match value {
        Value::Object(map) => map,
        other => {
            let mut context = LogContext::new();
            context.insert("value".to_string(), other);
            context
        }
    }
}

/// Process-wide mutable context merged into every record of a facade.
#[derive(Debug, Default)]
pub struct GlobalContext {
    inner: RwLock<LogContext>,
}

impl GlobalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge `context` into the current context.
    pub fn set(&self, context: LogContext) {
        self.write().extend(context);
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn snapshot(&self) -> LogContext {
        self.read().clone()
    }

    /// The current context with `call` merged over it.
    pub fn merge(&self, call: Option<LogContext>) -> LogContext {
        merge_context(&self.read(), call)
    }

    fn read(&self) -> RwLockReadGuard<'_, LogContext> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LogContext> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
