//! Log destinations and the writers that feed them.
//!
//! Writes are either performed inline under a mutex (`Output::Sync`) or handed
//! to a single background thread (`Output::Buffered`). Flush requests travel
//! through the same channel as records, so a flush completes only once every
//! record queued before it has been written.

use crate::engine::FlushCallback;
use crate::error::{EngineError, EngineResult};
use crate::metrics::EngineMetrics;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Where serialized records go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    Stdout,
    Stderr,
    /// Append to a file, creating it if missing.
    File(PathBuf),
    /// Capture in memory.
    #[serde(skip)]
    Memory(MemorySink),
}

impl FromStr for Destination {
    type Err = Infallible;

    /// `stdout` and `stderr` name the standard streams; anything else is a file path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "stdout" | "-" => Destination::Stdout,
            "stderr" => Destination::Stderr,
            path => Destination::File(PathBuf::from(path)),
        })
    }
}

/// In-memory destination. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every complete line written so far.
    pub fn lines(&self) -> Vec<String> {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Every line parsed as JSON. Lines that are not JSON are skipped.
    pub fn records(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

type BoxWriter = Box<dyn Write + Send>;

fn open_writer(destination: &Destination) -> EngineResult<BoxWriter> {
    Ok(match destination {
        Destination::Stdout => Box::new(io::stdout()),
        Destination::Stderr => Box::new(io::stderr()),
        Destination::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Box::new(BufWriter::new(file))
        }
        Destination::Memory(sink) => Box::new(sink.clone()),
    })
}

/// The writing half of an engine.
pub(crate) enum Output {
    Sync(Mutex<BoxWriter>),
    Buffered(BufferedWriter),
}

impl Output {
    pub(crate) fn open(
        destination: &Destination,
        buffered: bool,
        metrics: EngineMetrics,
    ) -> EngineResult<Self> {
        let writer = open_writer(destination)?;
        if buffered {
            Ok(Output::Buffered(BufferedWriter::spawn(writer, metrics)?))
        } else {
            Ok(Output::Sync(Mutex::new(writer)))
        }
    }

    pub(crate) fn write_line(&self, line: Vec<u8>) -> EngineResult<()> {
        match self {
            Output::Sync(writer) => {
                let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
                writer.write_all(&line)?;
                Ok(())
            }
            Output::Buffered(writer) => writer.send(Command::Line(line)),
        }
    }

    pub(crate) fn flush(&self, on_complete: FlushCallback) {
        match self {
            Output::Sync(writer) => {
                let result = writer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .flush()
                    .map_err(EngineError::from);
                on_complete(result);
            }
            Output::Buffered(writer) => {
                if let Err(Command::Flush(on_complete)) = writer.try_send(Command::Flush(on_complete)) {
                    on_complete(Err(EngineError::WriterClosed));
                }
            }
        }
    }
}

pub(crate) enum Command {
    Line(Vec<u8>),
    Flush(FlushCallback),
}

pub(crate) struct BufferedWriter {
    tx: Option<mpsc::UnboundedSender<Command>>,
    handle: Option<JoinHandle<()>>,
}

impl BufferedWriter {
    fn spawn(mut writer: BoxWriter, metrics: EngineMetrics) -> EngineResult<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();

        let handle = std::thread::Builder::new()
            .name("logfacade-writer".to_string())
            .spawn(move || {
                let mut failure: Option<String> = None;
                while let Some(command) = rx.blocking_recv() {
                    match command {
                        Command::Line(line) => {
                            if let Err(e) = writer.write_all(&line) {
                                metrics.inc_write_errors();
                                warn!(error = %e, "Background log write failed");
                                failure.get_or_insert_with(|| e.to_string());
                            }
                        }
                        Command::Flush(on_complete) => {
                            let flushed = writer.flush();
                            let result = match (failure.take(), flushed) {
                                (Some(message), _) => Err(EngineError::Writer(message)),
                                (None, Err(e)) => Err(EngineError::Io(e)),
                                (None, Ok(())) => Ok(()),
                            };
                            on_complete(result);
                        }
                    }
                }
                if let Err(e) = writer.flush() {
                    warn!(error = %e, "Final log flush failed");
                }
                debug!("Background log writer stopped");
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    fn send(&self, command: Command) -> EngineResult<()> {
        self.try_send(command).map_err(|_| EngineError::WriterClosed)
    }

    /// Queue a command, handing it back if the writer thread is gone.
    fn try_send(&self, command: Command) -> Result<(), Command> {
        match &self.tx {
            Some(tx) => tx.send(command).map_err(|e| e.0),
            None => Err(command),
        }
    }
}

impl Drop for BufferedWriter {
    fn drop(&mut self) {
        // closing the channel lets the thread drain and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
