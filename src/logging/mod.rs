//! Logging initialization using `tracing` and `tracing-subscriber`.
//!
//! The process subscriber carries two layers: a console layer on stderr and a
//! run-log layer that writes into whichever file is currently attached to the
//! [`LogContext`]. With no file attached the run-log output is dropped.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
        }
    }

    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
        }
    }
}

/// Shared slot for the current run log file.
#[derive(Debug, Clone, Default)]
pub struct RunSink {
    file: Arc<Mutex<Option<File>>>,
}

pub struct RunSinkWriter {
    file: Arc<Mutex<Option<File>>>,
}

impl Write for RunSinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut slot = self.file.lock();
        match slot.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut slot = self.file.lock();
        match slot.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RunSink {
    type Writer = RunSinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RunSinkWriter {
            file: Arc::clone(&self.file),
        }
    }
}

/// Logging handle built once at startup and handed to the orchestrators.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    level: LogLevel,
    sink: RunSink,
}

impl LogContext {
    /// Context that is not wired to any subscriber. Attaching a run log still
    /// creates the file, which is enough for tests and embedding callers.
    pub fn detached(level: LogLevel) -> Self {
        Self {
            level,
            sink: RunSink::default(),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn sink(&self) -> RunSink {
        self.sink.clone()
    }

    /// Route run-log output into `path` until the returned guard is dropped.
    pub fn attach_run_log(&self, path: &Path) -> Result<RunLogGuard> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        *self.sink.file.lock() = Some(file);
        Ok(RunLogGuard {
            sink: self.sink.clone(),
            path: path.to_path_buf(),
        })
    }

    pub fn run_log_attached(&self) -> bool {
        self.sink.file.lock().is_some()
    }
}

#[must_use = "the run log detaches as soon as the guard is dropped"]
pub struct RunLogGuard {
    sink: RunSink,
    path: PathBuf,
}

impl RunLogGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLogGuard {
    fn drop(&mut self) {
        if let Some(mut file) = self.sink.file.lock().take() {
            let _ = file.flush();
        }
    }
}

/// Install the process subscriber and return the context tied to it. Safe to
/// call more than once; later calls get a context whose run log is not wired.
pub fn init(level: LogLevel) -> Result<LogContext> {
    let ctx = LogContext::detached(level);
    if tracing::dispatcher::has_been_set() {
        return Ok(ctx);
    }

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(console_filter);
    let run_log = fmt::layer()
        .with_writer(ctx.sink())
        .with_ansi(false)
        .with_target(false)
        .with_filter(level.as_filter());

    let _ = tracing_subscriber::registry()
        .with(console)
        .with(run_log)
        .try_init();

    Ok(ctx)
}
