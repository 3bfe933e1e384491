//! Context-aware structured logging facade.
//!
//! [`LogFacade`] wraps a [`LogEngine`] created on first use and adds:
//! - a global context merged into every record ([`LogFacade::set_context`])
//! - normalization of arbitrary error values ([`ensure_error`])
//! - one method per level, trace through fatal
//! - child facades with fixed bindings ([`LogFacade::child`])
//!
//! ```no_run
//! use logfacade::{to_context, LogFacade, LoggerOptions, Level};
//! use serde_json::json;
//!
//! # async fn run() -> logfacade::FacadeResult<()> {
//! let log = LogFacade::new();
//! log.initialize(Some(LoggerOptions::new().with_level(Level::Debug)))?;
//! log.set_context(to_context(json!({ "service": "billing" })))?;
//! log.info("Invoice created", Some(to_context(json!({ "invoiceId": 42 }))))?;
//! log.error(json!({ "message": "card declined", "code": "E402" }), "Charge failed", None)?;
//! log.flush().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Child facades carry only their bindings. They do not pick up the parent's
//! global context, even fields set before the child was created.

pub mod context;
pub mod error;
pub mod facade;
pub mod normalize;

pub use context::{merge_context, to_context, GlobalContext, LogContext};
pub use error::{FacadeError, FacadeResult};
pub use facade::{global, ChildFacade, EngineFactory, LogFacade};
pub use normalize::{ensure_error, format_error, ErrorInput, NormalizedError};

pub use logfacade_engine as engine;
pub use logfacade_engine::{
    Destination, EngineOptions, Level, LevelFilter, LogEngine, LoggerOptions, MemorySink,
    Redaction,
};
