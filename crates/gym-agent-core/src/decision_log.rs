//! DecisionLog: the per-process decision trace.
//!
//! Storage path: `<home>/logs/decision_trace_{YYYYmmdd_HHMMSS}.log`
//!
//! The log is an explicit context: it is created once at startup and handed
//! to every function that records decisions, rather than living in a global.
//! Each record is written to the trace file at every level and mirrored to
//! `tracing`, so the console verbosity follows the subscriber's filter.
//!
//! Writing never fails the caller: file errors are reported via `tracing`.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Local;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct DecisionLog {
    inner: Arc<Inner>,
}

struct Inner {
    path: Option<PathBuf>,
    file: Mutex<Option<File>>,
}

impl DecisionLog {
    /// Create a new trace file in `logs_dir`, named after the current local time.
    pub fn create(logs_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let logs_dir = logs_dir.as_ref();
        std::fs::create_dir_all(logs_dir).map_err(|e| StoreError::io(logs_dir, e))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = logs_dir.join(format!("decision_trace_{}.log", stamp));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        Ok(Self {
            inner: Arc::new(Inner {
                path: Some(path),
                file: Mutex::new(Some(file)),
            }),
        })
    }

    /// A log that only forwards to `tracing` and writes no file.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(Inner {
                path: None,
                file: Mutex::new(None),
            }),
        }
    }

    /// Path of the trace file, if one is being written.
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn record(&self, level: LogLevel, message: impl AsRef<str>) {
        let message = message.as_ref();
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }

        // A panic elsewhere while holding the lock leaves the file usable.
        let mut guard = self
            .inner
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(file) = guard.as_mut() {
            let line = format!(
                "{} - {} - {}\n",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                level,
                message
            );
            if let Err(e) = file.write_all(line.as_bytes()).and_then(|_| file.flush()) {
                tracing::warn!("[DecisionLog] Failed to write trace line: {}", e);
            }
        }
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.record(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(LogLevel::Info, message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.record(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(LogLevel::Error, message);
    }
}

impl fmt::Debug for DecisionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionLog")
            .field("path", &self.inner.path)
            .finish()
    }
}
