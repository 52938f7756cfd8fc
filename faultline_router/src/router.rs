//! # Error Router
//!
//! Receives normalized [`ErrorEvent`]s from the three hooks and handles each
//! one according to a [`RouterMode`] fixed at construction:
//!
//! | Mode                  | Handling                                          |
//! |-----------------------|---------------------------------------------------|
//! | `log_file`            | one leveled line in the file log                  |
//! | `system_log`          | one line in the system log                        |
//! | `throw`               | [`RaisedError`] returned to the caller            |
//! | `log_file_and_custom` | file log line, then [`CustomHandler`]             |
//!
//! The router never installs anything itself; see
//! [`HookRegistry`](crate::HookRegistry).

use crate::config::RouterSection;
use crate::error::{RaisedError, RouterError};
use crate::event::{ErrorEvent, ErrorKind, PanicRecord};
use crate::host::{FatalRecord, RuntimeError};
use crate::mode::{RouterMode, Severity};
use crate::sink::{FileLogger, LogSink};
use crate::syslog::{SystemLog, SystemLogTarget};
use faultline::consts::{DEFAULT_FACILITY, DEFAULT_LOG_SUBDIR};
use std::fmt;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extension point invoked after the file log write in
/// `log_file_and_custom` mode.
///
/// The default does nothing. Closures taking `&ErrorEvent` implement it.
pub trait CustomHandler: Send + Sync {
    fn on_custom_error(&self, _event: &ErrorEvent) {}
}

/// The default [`CustomHandler`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl CustomHandler for NoopHandler {}

impl<F> CustomHandler for F
where
    F: Fn(&ErrorEvent) + Send + Sync,
{
    fn on_custom_error(&self, event: &ErrorEvent) {
        self(event)
    }
}

// The sink exists exactly in the two file-log routes.
enum Route {
    LogFile {
        sink: Arc<dyn LogSink>,
    },
    SystemLog {
        log: Box<dyn SystemLog>,
    },
    Throw,
    LogFileAndCustom {
        sink: Arc<dyn LogSink>,
        custom: Arc<dyn CustomHandler>,
    },
}

pub struct ErrorRouter {
    mode: RouterMode,
    route: Route,
}

impl ErrorRouter {
    /// Build a router with the stock sinks.
    ///
    /// File-log modes open `<log_dir>/faultline.log`; `log_dir` defaults to
    /// a `log` directory beside the running executable.
    pub fn new(mode: RouterMode, log_dir: Option<&Path>) -> Result<Self, RouterError> {
        let mut builder = Self::builder(mode);
        if let Some(dir) = log_dir {
            builder = builder.log_dir(dir);
        }
        builder.build()
    }

    /// Build a router from the `[router]` config table.
    pub fn from_config(section: &RouterSection) -> Result<Self, RouterError> {
        let mut builder = Self::builder(section.mode)
            .verbosity(section.verbosity)
            .facility(section.facility.clone())
            .system_log_target(section.system_log);
        if let Some(dir) = &section.log_dir {
            builder = builder.log_dir(dir);
        }
        builder.build()
    }

    pub fn builder(mode: RouterMode) -> RouterBuilder {
        RouterBuilder::new(mode)
    }

    pub fn mode(&self) -> RouterMode {
        self.mode
    }

    /// The file log, present only in the file-log modes.
    pub fn log_sink(&self) -> Option<&Arc<dyn LogSink>> {
        match &self.route {
            Route::LogFile { sink } | Route::LogFileAndCustom { sink, .. } => Some(sink),
            Route::SystemLog { .. } | Route::Throw => None,
        }
    }

    /// Handle one event.
    ///
    /// Only THROW mode returns an error. Sink write failures are dropped.
    pub fn dispatch(&self, event: &ErrorEvent) -> Result<(), RaisedError> {
        tracing::trace!(kind = %event.kind(), mode = %self.mode, "Dispatching error event");

        match &self.route {
            Route::LogFile { sink } => {
                write_log_line(sink.as_ref(), event);
                Ok(())
            }
            Route::LogFileAndCustom { sink, custom } => {
                write_log_line(sink.as_ref(), event);
                custom.on_custom_error(event);
                Ok(())
            }
            Route::SystemLog { log } => {
                let _ = log.write(&event.system_log_line());
                Ok(())
            }
            Route::Throw => Err(RaisedError::new(
                event.message(),
                event.code(),
                event.source_file(),
                event.source_line(),
            )),
        }
    }

    // ─── Hook adapters ──────────────────────────────────────────────

    /// Panic hook adapter: EXCEPTION, original = [`PanicRecord`].
    pub fn handle_panic(&self, info: &PanicHookInfo<'_>) -> Result<(), RaisedError> {
        self.dispatch(&PanicRecord::from_hook_info(info).into_event())
    }

    /// Runtime-error hook adapter: ERROR, no original.
    pub fn handle_error(&self, error: &RuntimeError) -> Result<(), RaisedError> {
        let event = ErrorEvent::new(
            ErrorKind::Error,
            error.code,
            error.message.clone(),
            error.file.clone(),
            error.line,
        );
        self.dispatch(&event)
    }

    /// Exit hook adapter: SHUTDOWN with code 0, original = the record.
    /// Does nothing without a record.
    pub fn handle_shutdown(&self, record: Option<FatalRecord>) -> Result<(), RaisedError> {
        let Some(record) = record else {
            return Ok(());
        };
        let event = ErrorEvent::new(
            ErrorKind::Shutdown,
            0,
            record.message.clone(),
            record.file.clone(),
            record.line,
        )
        .with_original(record);
        self.dispatch(&event)
    }
}

impl fmt::Debug for ErrorRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorRouter")
            .field("mode", &self.mode)
            .field("has_log_sink", &self.log_sink().is_some())
            .finish()
    }
}

fn write_log_line(sink: &dyn LogSink, event: &ErrorEvent) {
    let _ = sink.write(event.kind().severity(), &event.log_line());
}

/// Directory used when no log directory is configured: `log/` beside the
/// executable, or `./log` if the executable path is unknown.
pub fn default_log_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_LOG_SUBDIR)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_SUBDIR))
}

/// Builder for [`ErrorRouter`] with injectable collaborators.
///
/// Collaborators the mode does not use are dropped by [`build`](Self::build).
pub struct RouterBuilder {
    mode: RouterMode,
    log_dir: Option<PathBuf>,
    verbosity: Severity,
    facility: String,
    system_log_target: SystemLogTarget,
    log_sink: Option<Arc<dyn LogSink>>,
    system_log: Option<Box<dyn SystemLog>>,
    custom: Option<Arc<dyn CustomHandler>>,
}

impl RouterBuilder {
    fn new(mode: RouterMode) -> Self {
        Self {
            mode,
            log_dir: None,
            verbosity: Severity::Warning,
            facility: DEFAULT_FACILITY.to_string(),
            system_log_target: SystemLogTarget::default(),
            log_sink: None,
            system_log: None,
            custom: None,
        }
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn verbosity(mut self, verbosity: Severity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn facility(mut self, facility: impl Into<String>) -> Self {
        self.facility = facility.into();
        self
    }

    pub fn system_log_target(mut self, target: SystemLogTarget) -> Self {
        self.system_log_target = target;
        self
    }

    /// Use `sink` instead of opening a [`FileLogger`].
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Use `log` instead of opening the configured system log target.
    pub fn system_log(mut self, log: Box<dyn SystemLog>) -> Self {
        self.system_log = Some(log);
        self
    }

    pub fn custom_handler(mut self, handler: Arc<dyn CustomHandler>) -> Self {
        self.custom = Some(handler);
        self
    }

    pub fn build(self) -> Result<ErrorRouter, RouterError> {
        let mode = self.mode;
        let route = match mode {
            RouterMode::LogFile => Route::LogFile {
                sink: self.resolve_log_sink()?,
            },
            RouterMode::LogFileAndCustom => {
                let custom = self
                    .custom
                    .clone()
                    .unwrap_or_else(|| Arc::new(NoopHandler));
                Route::LogFileAndCustom {
                    sink: self.resolve_log_sink()?,
                    custom,
                }
            }
            RouterMode::SystemLog => Route::SystemLog {
                log: match self.system_log {
                    Some(log) => log,
                    None => self.system_log_target.open(&self.facility)?,
                },
            },
            RouterMode::Throw => Route::Throw,
        };

        tracing::debug!(%mode, "Error router built");
        Ok(ErrorRouter { mode, route })
    }

    fn resolve_log_sink(&self) -> Result<Arc<dyn LogSink>, RouterError> {
        if let Some(sink) = &self.log_sink {
            return Ok(Arc::clone(sink));
        }
        let dir = self.log_dir.clone().unwrap_or_else(default_log_dir);
        Ok(Arc::new(FileLogger::open(&dir, self.verbosity, &self.facility)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemorySink {
        lines: Mutex<Vec<(Severity, String)>>,
    }

    impl LogSink for MemorySink {
        fn write(&self, severity: Severity, line: &str) -> io::Result<()> {
            self.lines.lock().push((severity, line.to_string()));
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct MemorySystemLog {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl SystemLog for MemorySystemLog {
        fn write(&self, line: &str) -> io::Result<()> {
            self.lines.lock().push(line.to_string());
            Ok(())
        }
    }

    struct FailingSink;

    impl LogSink for FailingSink {
        fn write(&self, _severity: Severity, _line: &str) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    fn router_with_sink(mode: RouterMode) -> (ErrorRouter, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let router = ErrorRouter::builder(mode)
            .log_sink(sink.clone())
            .build()
            .unwrap();
        (router, sink)
    }

    fn boom() -> ErrorEvent {
        ErrorEvent::new(ErrorKind::Exception, 7, "boom", "app.ext", 42)
    }

    #[test]
    fn test_log_file_writes_one_line_per_event() {
        let (router, sink) = router_with_sink(RouterMode::LogFile);

        router.dispatch(&boom()).unwrap();
        router
            .dispatch(&ErrorEvent::new(ErrorKind::Error, 2, "bad index", "vec.rs", 3))
            .unwrap();
        router
            .dispatch(&ErrorEvent::new(ErrorKind::Shutdown, 0, "oom", "main.rs", 1))
            .unwrap();

        let lines = sink.lines.lock();
        assert_eq!(
            *lines,
            vec![
                (
                    Severity::Warning,
                    "EXCEPTION, FILE:app.ext:42, ERRNO:7, boom".to_string()
                ),
                (Severity::Error, "ERROR, FILE:vec.rs:3, ERRNO:2, bad index".to_string()),
                (Severity::Emergency, "SHUTDOWN, FILE:main.rs:1, ERRNO:0, oom".to_string()),
            ]
        );
    }

    #[test]
    fn test_log_file_and_custom_calls_handler_once() {
        let sink = Arc::new(MemorySink::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_handler = Arc::clone(&seen);
        let router = ErrorRouter::builder(RouterMode::LogFileAndCustom)
            .log_sink(sink.clone())
            .custom_handler(Arc::new(move |event: &ErrorEvent| {
                seen_by_handler
                    .lock()
                    .push((event.kind(), event.code(), event.log_line()));
            }))
            .build()
            .unwrap();

        router.dispatch(&boom()).unwrap();

        assert_eq!(sink.lines.lock().len(), 1);
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            (
                ErrorKind::Exception,
                7,
                "EXCEPTION, FILE:app.ext:42, ERRNO:7, boom".to_string()
            )
        );
    }

    #[test]
    fn test_custom_handler_not_called_in_log_file_mode() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let router = ErrorRouter::builder(RouterMode::LogFile)
            .log_sink(Arc::new(MemorySink::default()))
            .custom_handler(Arc::new(move |_: &ErrorEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .unwrap();

        router.dispatch(&boom()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_system_log_lines() {
        let log = MemorySystemLog::default();
        let router = ErrorRouter::builder(RouterMode::SystemLog)
            .system_log(Box::new(log.clone()))
            .build()
            .unwrap();

        router.dispatch(&boom()).unwrap();
        router
            .handle_shutdown(Some(FatalRecord::new("oom", "main.rs", 1)))
            .unwrap();

        let lines = log.lines.lock();
        assert_eq!(lines[0], "EXCEPTION, FILE:app.ext:42, ERRNO:7, boom");
        assert_eq!(
            lines[1],
            "SHUTDOWN: FatalRecord {\n    message: \"oom\",\n    file: \"main.rs\",\n    line: 1,\n}"
        );
    }

    #[test]
    fn test_throw_raises() {
        let router = ErrorRouter::new(RouterMode::Throw, None).unwrap();
        assert!(router.log_sink().is_none());

        let raised = router
            .dispatch(&ErrorEvent::new(ErrorKind::Error, 8, "undefined offset", "lookup.rs", 17))
            .unwrap_err();
        assert_eq!(
            raised,
            RaisedError {
                message: "undefined offset".to_string(),
                code: 0,
                error_code: 8,
                file: "lookup.rs".to_string(),
                line: 17,
            }
        );
    }

    #[test]
    fn test_throw_raises_for_every_kind() {
        let router = ErrorRouter::new(RouterMode::Throw, None).unwrap();
        assert!(router.dispatch(&boom()).is_err());
        assert!(
            router
                .handle_shutdown(Some(FatalRecord::new("oom", "main.rs", 1)))
                .is_err()
        );
    }

    #[test]
    fn test_sink_only_in_file_modes() {
        let sink: Arc<dyn LogSink> = Arc::new(MemorySink::default());
        for mode in RouterMode::ALL {
            let router = ErrorRouter::builder(mode)
                .log_sink(Arc::clone(&sink))
                .system_log(Box::new(MemorySystemLog::default()))
                .build()
                .unwrap();
            assert_eq!(router.log_sink().is_some(), mode.uses_log_sink(), "{mode}");
        }
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let router = ErrorRouter::builder(RouterMode::LogFile)
            .log_sink(Arc::new(FailingSink))
            .build()
            .unwrap();
        assert!(router.dispatch(&boom()).is_ok());
    }

    #[test]
    fn test_handle_error_is_error_kind() {
        let (router, sink) = router_with_sink(RouterMode::LogFile);
        router
            .handle_error(&RuntimeError {
                code: 2,
                message: "division by zero".to_string(),
                file: "calc.rs".to_string(),
                line: 9,
            })
            .unwrap();

        assert_eq!(
            sink.lines.lock()[0],
            (
                Severity::Error,
                "ERROR, FILE:calc.rs:9, ERRNO:2, division by zero".to_string()
            )
        );
    }

    #[test]
    fn test_handle_shutdown_without_record_is_noop() {
        let (router, sink) = router_with_sink(RouterMode::LogFile);
        router.handle_shutdown(None).unwrap();
        assert!(sink.lines.lock().is_empty());

        let router = ErrorRouter::new(RouterMode::Throw, None).unwrap();
        assert!(router.handle_shutdown(None).is_ok());
    }

    #[test]
    fn test_handle_shutdown_code_is_zero() {
        let (router, sink) = router_with_sink(RouterMode::LogFile);
        router
            .handle_shutdown(Some(FatalRecord::new("stack overflow", "deep.rs", 99)))
            .unwrap();
        assert_eq!(
            sink.lines.lock()[0],
            (
                Severity::Emergency,
                "SHUTDOWN, FILE:deep.rs:99, ERRNO:0, stack overflow".to_string()
            )
        );
    }

    #[test]
    fn test_new_writes_to_file_log() {
        let tmp = TempDir::new().unwrap();
        let router = ErrorRouter::new(RouterMode::LogFile, Some(tmp.path())).unwrap();

        router.dispatch(&boom()).unwrap();

        let content = std::fs::read_to_string(tmp.path().join("faultline.log")).unwrap();
        let line = content.lines().next().unwrap();
        assert!(
            line.ends_with("[WARN] EXCEPTION, FILE:app.ext:42, ERRNO:7, boom"),
            "got {line}"
        );
    }

    #[test]
    fn test_from_config_section() {
        let tmp = TempDir::new().unwrap();
        let section = RouterSection {
            mode: RouterMode::LogFileAndCustom,
            log_dir: Some(tmp.path().to_path_buf()),
            verbosity: Severity::Error,
            facility: "billing".to_string(),
            system_log: SystemLogTarget::Stderr,
        };

        let router = ErrorRouter::from_config(&section).unwrap();
        assert_eq!(router.mode(), RouterMode::LogFileAndCustom);

        // Below the configured verbosity.
        router.dispatch(&boom()).unwrap();
        router
            .dispatch(&ErrorEvent::new(ErrorKind::Error, 1, "kept", "a.rs", 1))
            .unwrap();

        let content = std::fs::read_to_string(tmp.path().join("billing.log")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("ERROR, FILE:a.rs:1, ERRNO:1, kept"));
    }

    #[test]
    fn test_from_config_syslog_target() {
        let section = RouterSection {
            mode: RouterMode::SystemLog,
            facility: "faultline-router-test".to_string(),
            system_log: SystemLogTarget::Syslog,
            ..RouterSection::default()
        };

        let router = ErrorRouter::from_config(&section).unwrap();
        assert_eq!(router.mode(), RouterMode::SystemLog);
        assert!(router.log_sink().is_none());
        assert!(router.dispatch(&boom()).is_ok());
    }

    #[test]
    fn test_default_log_dir_is_named_log() {
        assert!(default_log_dir().ends_with(DEFAULT_LOG_SUBDIR));
    }
}
