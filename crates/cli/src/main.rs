//! Command-line front end for the log facade.

use clap::{Args, Parser, Subcommand, ValueEnum};
use logfacade::engine::{init_logging, TracingEngine};
use logfacade::{
    global, Destination, ErrorInput, Level, LevelFilter, LogContext, LogEngine, LogFacade,
    LoggerOptions,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "logfacade")]
#[command(about = "Write structured JSON log records from the command line")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Minimum level written (trace, debug, info, warn, error, fatal, silent)
    #[arg(long, env = "LOGFACADE_LEVEL", default_value = "info", global = true)]
    min_level: LevelFilter,

    /// Where records go: stdout, stderr or a file path
    #[arg(long, env = "LOGFACADE_DESTINATION", default_value = "stdout", global = true)]
    destination: Destination,

    /// Logger name written on every record
    #[arg(long, env = "LOGFACADE_NAME", global = true)]
    name: Option<String>,

    /// Write through a background thread
    #[arg(long, env = "LOGFACADE_BUFFERED", global = true)]
    buffered: bool,

    /// Engine records are handed to
    #[arg(long, value_enum, default_value = "json", global = true)]
    engine: EngineKind,

    /// Print engine metrics to stderr when done
    #[arg(long, global = true)]
    metrics: bool,

    /// Filter for diagnostic output (defaults to RUST_LOG, then info)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// JSON lines to the destination
    Json,
    /// Events on the diagnostic tracing subscriber
    Tracing,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one record
    Emit {
        /// Record message
        #[arg(long)]
        message: String,

        /// Record level
        #[arg(long, default_value = "info")]
        level: Level,

        /// Context field as KEY=VALUE; VALUE is parsed as JSON when possible
        #[arg(long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,
    },
    /// Write an error record
    Error {
        /// Record message
        #[arg(long)]
        message: String,

        /// Error value; JSON objects keep their fields, anything else is text
        #[arg(long)]
        error: String,

        /// Log at fatal instead of error
        #[arg(long)]
        fatal: bool,

        /// Context field as KEY=VALUE; VALUE is parsed as JSON when possible
        #[arg(long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,
    },
}

impl EngineArgs {
    fn logger_options(&self) -> LoggerOptions {
        let mut options = LoggerOptions::new()
            .with_level(self.min_level)
            .with_destination(self.destination.clone())
            .with_buffered(self.buffered);
        if let Some(name) = &self.name {
            options = options.with_name(name.clone());
        }
        options
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.engine.log_level.as_deref())?;

    let custom;
    let log: &LogFacade = match cli.engine.engine {
        EngineKind::Json => global(),
        EngineKind::Tracing => {
            custom = LogFacade::with_factory(|options| {
                let engine: Arc<dyn LogEngine> = Arc::new(TracingEngine::new(options)?);
                Ok(engine)
            });
            &custom
        }
    };
    log.initialize(Some(cli.engine.logger_options()))?;
    debug!(engine = ?cli.engine.engine, "Log facade ready");

    match cli.command {
        Commands::Emit {
            message,
            level,
            context,
        } => {
            log.log(level, &message, Some(parse_context(&context)?))?;
        }
        Commands::Error {
            message,
            error,
            fatal,
            context,
        } => {
            let context = Some(parse_context(&context)?);
            let error = parse_error_value(&error);
            if fatal {
                log.fatal(error, &message, context)?;
            } else {
                log.error(error, &message, context)?;
            }
        }
    }

    log.flush().await?;

    if cli.engine.metrics {
        if let Some(metrics) = log.raw()?.metrics() {
            eprint!("{}", metrics.gather()?);
        }
    }

    Ok(())
}

/// Parse `KEY=VALUE` pairs into a context.
fn parse_context(pairs: &[String]) -> anyhow::Result<LogContext> {
    let mut context = LogContext::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Context field must be KEY=VALUE, got {:?}", pair))?;
        if key.is_empty() {
            return Err(anyhow::anyhow!("Context field has an empty key: {:?}", pair));
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        context.insert(key.to_string(), value);
    }
    Ok(context)
}

fn parse_error_value(raw: &str) -> ErrorInput {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => ErrorInput::from(value),
        Err(_) => ErrorInput::Text(raw.to_string()),
    }
}
