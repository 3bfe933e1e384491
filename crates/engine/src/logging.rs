//! Diagnostic logging for the engine itself.
//!
//! Engines report their own lifecycle events (construction, background write
//! failures) through `tracing`. Binaries install a subscriber for those with
//! [`init_logging`]; diagnostics go to stderr so they never interleave with
//! records written to stdout.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the diagnostic filter: an explicit level wins, then `RUST_LOG`,
/// then `info`.
pub fn diagnostic_filter(log_level: Option<&str>) -> EnvFilter {
    match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Initialize structured diagnostic logging with environment-based filtering.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "info", "logfacade_engine=debug")
pub fn init_logging(log_level: Option<&str>) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(diagnostic_filter(log_level))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
