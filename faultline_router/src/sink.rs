//! Leveled file log.
//!
//! [`LogSink`] is the collaborator the router writes to in the `log_file`
//! modes. [`FileLogger`] is the stock implementation: one append-only file
//! per facility, one timestamped line per entry.

use crate::error::RouterError;
use crate::mode::Severity;
use chrono::Local;
use faultline::consts::{LOG_FILE_EXTENSION, LOG_TIMESTAMP_FORMAT};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Destination for formatted error lines.
pub trait LogSink: Send + Sync {
    /// Write one line at the given severity.
    fn write(&self, severity: Severity, line: &str) -> io::Result<()>;

    fn warn(&self, line: &str) -> io::Result<()> {
        self.write(Severity::Warning, line)
    }

    fn error(&self, line: &str) -> io::Result<()> {
        self.write(Severity::Error, line)
    }

    fn emergency(&self, line: &str) -> io::Result<()> {
        self.write(Severity::Emergency, line)
    }
}

/// Append-only file log at `<dir>/<facility>.log`.
///
/// Lines below `verbosity` are dropped. Concurrent writers are serialized.
#[derive(Debug)]
pub struct FileLogger {
    path: PathBuf,
    verbosity: Severity,
    file: Mutex<File>,
}

impl FileLogger {
    /// Open (creating directory and file as needed) the log for `facility`
    /// inside `dir`.
    pub fn open(dir: &Path, verbosity: Severity, facility: &str) -> Result<Self, RouterError> {
        let path = dir.join(format!("{facility}.{LOG_FILE_EXTENSION}"));

        fs::create_dir_all(dir).map_err(|source| RouterError::LogOpen {
            path: path.clone(),
            source,
        })?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| RouterError::LogOpen {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("File log opened at {}", path.display());

        Ok(Self {
            path,
            verbosity,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn verbosity(&self) -> Severity {
        self.verbosity
    }
}

impl LogSink for FileLogger {
    fn write(&self, severity: Severity, line: &str) -> io::Result<()> {
        if severity < self.verbosity {
            return Ok(());
        }
        let timestamp = Local::now().format(LOG_TIMESTAMP_FORMAT);
        let mut file = self.file.lock();
        writeln!(file, "{timestamp} [{}] {line}", severity.label())?;
        file.flush()
    }
}
