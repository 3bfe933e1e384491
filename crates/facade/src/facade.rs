//! The log facade service object.

use crate::context::{GlobalContext, LogContext};
use crate::error::{FacadeError, FacadeResult};
use crate::normalize::{ensure_error, format_error, ErrorInput};
use logfacade_engine::{EngineOptions, EngineResult, JsonEngine, Level, LogEngine, LoggerOptions};
use once_cell::sync::{Lazy, OnceCell};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Builds the engine when a facade is first initialized.
pub type EngineFactory =
    Box<dyn Fn(EngineOptions) -> EngineResult<Arc<dyn LogEngine>> + Send + Sync>;

static GLOBAL: Lazy<LogFacade> = Lazy::new(LogFacade::new);

/// The process-wide facade.
///
/// Libraries should prefer taking a `&LogFacade`; this accessor exists for
/// binaries that want a single shared instance.
pub fn global() -> &'static LogFacade {
    &GLOBAL
}

/// Structured logging facade.
///
/// Owns one engine, created on first use and never replaced, plus a mutable
/// context merged into every record logged through the facade.
pub struct LogFacade {
    engine: OnceCell<Arc<dyn LogEngine>>,
    context: GlobalContext,
    factory: EngineFactory,
}

impl LogFacade {
    /// Facade backed by a [`JsonEngine`].
    pub fn new() -> Self {
        Self::with_factory(|options| {
            let engine: Arc<dyn LogEngine> = Arc::new(JsonEngine::new(options)?);
            Ok(engine)
        })
    }

    /// Facade that builds its engine with `factory`.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(EngineOptions) -> EngineResult<Arc<dyn LogEngine>> + Send + Sync + 'static,
    {
        Self {
            engine: OnceCell::new(),
            context: GlobalContext::new(),
            factory: Box::new(factory),
        }
    }

    /// Facade around an existing engine. [`initialize`](Self::initialize)
    /// is a no-op on it.
    pub fn with_engine(engine: Arc<dyn LogEngine>) -> Self {
        let shared = Arc::clone(&engine);
        let facade = Self::with_factory(move |_| Ok(Arc::clone(&shared)));
        let _ = facade.engine.set(engine);
        facade
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Build the engine from the defaults merged with `options`.
    ///
    /// Only the first call has any effect. Later calls, whatever their
    /// options, leave the existing engine in place.
    pub fn initialize(&self, options: Option<LoggerOptions>) -> FacadeResult<()> {
        if self.is_initialized() {
            if options.is_some() {
                debug!("Log engine already initialized, ignoring options");
            }
            return Ok(());
        }
        self.engine.get_or_try_init(|| self.build_engine(options))?;
        Ok(())
    }

    fn build_engine(&self, options: Option<LoggerOptions>) -> EngineResult<Arc<dyn LogEngine>> {
        let options = EngineOptions::default().merge(options.unwrap_or_default());
        debug!(level = %options.level, "Initializing log engine");
        (self.factory)(options)
    }

    fn ensure_initialized(&self) -> FacadeResult<&Arc<dyn LogEngine>> {
        let engine = self.engine.get_or_try_init(|| self.build_engine(None))?;
        Ok(engine)
    }

    /// Add fields to the global context. Existing keys are overwritten.
    pub fn set_context(&self, context: LogContext) -> FacadeResult<()> {
        self.ensure_initialized()?;
        self.context.set(context);
        Ok(())
    }

    /// Remove every global context field.
    pub fn clear_context(&self) -> FacadeResult<()> {
        self.ensure_initialized()?;
        self.context.clear();
        Ok(())
    }

    /// Snapshot of the global context.
    pub fn context(&self) -> LogContext {
        self.context.snapshot()
    }

    pub fn trace(&self, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        self.log(Level::Trace, message, context)
    }

    pub fn debug(&self, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        self.log(Level::Debug, message, context)
    }

    pub fn info(&self, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        self.log(Level::Info, message, context)
    }

    pub fn warn(&self, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        self.log(Level::Warn, message, context)
    }

    /// Log `err`, normalized, under the `error` key.
    pub fn error(
        &self,
        err: impl Into<ErrorInput>,
        message: &str,
        context: Option<LogContext>,
    ) -> FacadeResult<()> {
        self.log(Level::Error, message, Some(with_error(context, err.into())))
    }

    /// Log `err`, normalized, under the `error` key at fatal level.
    pub fn fatal(
        &self,
        err: impl Into<ErrorInput>,
        message: &str,
        context: Option<LogContext>,
    ) -> FacadeResult<()> {
        self.log(Level::Fatal, message, Some(with_error(context, err.into())))
    }

    /// Log at `level` with the global context merged in.
    pub fn log(&self, level: Level, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        let engine = self.ensure_initialized()?;
        let fields = self.context.merge(context);
        engine.emit(level, fields, message)?;
        Ok(())
    }

    pub fn is_level_enabled(&self, level: Level) -> FacadeResult<bool> {
        Ok(self.ensure_initialized()?.is_enabled(level))
    }

    /// Derive a facade whose records always carry `bindings`.
    ///
    /// The child does not see this facade's global context, neither now nor
    /// after later [`set_context`](Self::set_context) calls.
    pub fn child(&self, bindings: LogContext) -> FacadeResult<ChildFacade> {
        let engine = self.ensure_initialized()?;
        Ok(ChildFacade {
            engine: engine.child(bindings),
        })
    }

    /// The underlying engine.
    pub fn raw(&self) -> FacadeResult<Arc<dyn LogEngine>> {
        Ok(Arc::clone(self.ensure_initialized()?))
    }

    /// Wait until the engine reports every record written so far as flushed.
    pub async fn flush(&self) -> FacadeResult<()> {
        let engine = Arc::clone(self.ensure_initialized()?);
        flush_engine(engine.as_ref()).await
    }
}

impl Default for LogFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFacade")
            .field("initialized", &self.is_initialized())
            .field("context", &self.context.snapshot())
            .finish_non_exhaustive()
    }
}

/// Facade over a derived engine carrying fixed bindings.
///
/// Records carry the bindings and the call-site fields only; the parent's
/// global context is not merged in.
#[derive(Clone)]
pub struct ChildFacade {
    engine: Arc<dyn LogEngine>,
}

impl ChildFacade {
    /// The derived engine.
    pub fn raw(&self) -> &Arc<dyn LogEngine> {
        &self.engine
    }

    pub fn bindings(&self) -> &LogContext {
        self.engine.bindings()
    }

    pub fn trace(&self, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        self.log(Level::Trace, message, context)
    }

    pub fn debug(&self, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        self.log(Level::Debug, message, context)
    }

    pub fn info(&self, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        self.log(Level::Info, message, context)
    }

    pub fn warn(&self, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        self.log(Level::Warn, message, context)
    }

    pub fn error(
        &self,
        err: impl Into<ErrorInput>,
        message: &str,
        context: Option<LogContext>,
    ) -> FacadeResult<()> {
        self.log(Level::Error, message, Some(with_error(context, err.into())))
    }

    pub fn fatal(
        &self,
        err: impl Into<ErrorInput>,
        message: &str,
        context: Option<LogContext>,
    ) -> FacadeResult<()> {
        self.log(Level::Fatal, message, Some(with_error(context, err.into())))
    }

    pub fn log(&self, level: Level, message: &str, context: Option<LogContext>) -> FacadeResult<()> {
        self.engine.emit(level, context.unwrap_or_default(), message)?;
        Ok(())
    }

    /// Derive a further child with `bindings` added to this one's.
    pub fn child(&self, bindings: LogContext) -> ChildFacade {
        ChildFacade {
            engine: self.engine.child(bindings),
        }
    }

    pub async fn flush(&self) -> FacadeResult<()> {
        flush_engine(self.engine.as_ref()).await
    }
}

impl fmt::Debug for ChildFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildFacade")
            .field("bindings", self.engine.bindings())
            .finish_non_exhaustive()
    }
}

fn with_error(context: Option<LogContext>, err: ErrorInput) -> LogContext {
    let mut context = context.unwrap_or_default();
    let error = format_error(&ensure_error(err));
    context.insert("error".to_string(), Value::Object(error));
    context
}

async fn flush_engine(engine: &dyn LogEngine) -> FacadeResult<()> {
    let (tx, rx) = oneshot::channel();
    engine.flush(Box::new(move |result| {
        let _ = tx.send(result);
    }));

    match rx.await {
        Ok(result) => Ok(result?),
        Err(_) => Err(FacadeError::FlushAbandoned),
    }
}
