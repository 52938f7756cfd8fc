//! Normalized error events.
//!
//! Every hook turns what it intercepted into an [`ErrorEvent`] before
//! handing it to the router. Events are immutable: the fields are private
//! and only readable through accessors.

use crate::mode::Severity;
use std::any::Any;
use std::fmt;
use std::panic::PanicHookInfo;
use thiserror::Error;

/// Category of an intercepted error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A panic that reached the panic hook.
    Exception,
    /// An error reported through the runtime-error hook.
    Error,
    /// A fatal record still pending at process exit.
    Shutdown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Exception => "EXCEPTION",
            ErrorKind::Error => "ERROR",
            ErrorKind::Shutdown => "SHUTDOWN",
        }
    }

    /// Severity used when the event is written to the file log.
    pub fn severity(self) -> Severity {
        match self {
            ErrorKind::Exception => Severity::Warning,
            ErrorKind::Error => Severity::Error,
            ErrorKind::Shutdown => Severity::Emergency,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque original error value carried alongside an event.
pub type Original = Box<dyn fmt::Debug + Send + Sync>;

/// One intercepted error, as seen by the router.
#[derive(Debug)]
pub struct ErrorEvent {
    kind: ErrorKind,
    code: i64,
    message: String,
    source_file: String,
    source_line: u32,
    original: Option<Original>,
}

impl ErrorEvent {
    pub fn new(
        kind: ErrorKind,
        code: i64,
        message: impl Into<String>,
        source_file: impl Into<String>,
        source_line: u32,
    ) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            source_file: source_file.into(),
            source_line,
            original: None,
        }
    }

    /// Attach the original error value.
    pub fn with_original(mut self, original: impl fmt::Debug + Send + Sync + 'static) -> Self {
        self.original = Some(Box::new(original));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn source_line(&self) -> u32 {
        self.source_line
    }

    pub fn original(&self) -> Option<&(dyn fmt::Debug + Send + Sync)> {
        self.original.as_deref()
    }

    /// The canonical log line:
    /// `<KIND>, FILE:<file>:<line>, ERRNO:<code>, <message>`.
    pub fn log_line(&self) -> String {
        format!(
            "{}, FILE:{}:{}, ERRNO:{}, {}",
            self.kind, self.source_file, self.source_line, self.code, self.message
        )
    }

    /// The system log line: `<KIND>: <pretty original>` when an original
    /// value is attached, the canonical log line otherwise.
    pub fn system_log_line(&self) -> String {
        match &self.original {
            Some(original) => format!("{}: {:#?}", self.kind, original),
            None => self.log_line(),
        }
    }
}

/// A panic payload carrying an explicit error code.
///
/// ```rust,no_run
/// use faultline_router::Exception;
///
/// std::panic::panic_any(Exception::new(7, "boom"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Exception {
    pub code: i64,
    pub message: String,
}

impl Exception {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Everything the panic hook learned about a panic. Attached as the
/// original value of EXCEPTION events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicRecord {
    pub message: String,
    pub code: i64,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub thread: String,
}

impl PanicRecord {
    pub fn from_hook_info(info: &PanicHookInfo<'_>) -> Self {
        let (code, message) = describe_payload(info.payload());
        let (file, line, column) = info
            .location()
            .map(|l| (l.file().to_string(), l.line(), l.column()))
            .unwrap_or_else(|| ("<unknown>".to_string(), 0, 0));
        let thread = std::thread::current()
            .name()
            .unwrap_or("<unnamed>")
            .to_string();

        Self {
            message,
            code,
            file,
            line,
            column,
            thread,
        }
    }

    pub fn into_event(self) -> ErrorEvent {
        ErrorEvent::new(
            ErrorKind::Exception,
            self.code,
            self.message.clone(),
            self.file.clone(),
            self.line,
        )
        .with_original(self)
    }
}

/// Extract `(code, message)` from a panic payload.
pub fn describe_payload(payload: &(dyn Any + Send)) -> (i64, String) {
    if let Some(exception) = payload.downcast_ref::<Exception>() {
        (exception.code, exception.message.clone())
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (0, (*s).to_string())
    } else if let Some(s) = payload.downcast_ref::<String>() {
        (0, s.clone())
    } else {
        (0, "Box<dyn Any>".to_string())
    }
}
