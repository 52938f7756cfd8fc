//! Error types for router construction, hook registration and THROW mode.

use faultline::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building an [`ErrorRouter`](crate::ErrorRouter).
#[derive(Error, Debug)]
pub enum RouterError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Mode value outside the four defined modes.
    #[error("Invalid router mode: {0} (expected 0-3 or log_file, system_log, throw, log_file_and_custom)")]
    InvalidMode(String),

    /// The file log could not be opened.
    #[error("Failed to open log file: {path}")]
    LogOpen {
        /// Path of the log file
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The system log could not be opened.
    #[error("Failed to open system log: {0}")]
    SystemLogOpen(String),
}

/// Errors raised while installing a [`HookRegistry`](crate::HookRegistry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `atexit(3)` refused the exit trampoline.
    #[error("Failed to register process exit hook")]
    ExitHook,
}

/// The error surfaced by a router in THROW mode.
///
/// Carries the reported message, a fixed outer `code` of 0 and the
/// reported code in `error_code`, together with the source location.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RaisedError {
    /// Reported message.
    pub message: String,
    /// Outer code, always 0.
    pub code: i64,
    /// Code of the reported error.
    pub error_code: i64,
    /// Source file of the reported error.
    pub file: String,
    /// Source line of the reported error.
    pub line: u32,
}

impl RaisedError {
    /// Build a raised error from the reported fields.
    pub fn new(message: impl Into<String>, error_code: i64, file: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            code: 0,
            error_code,
            file: file.into(),
            line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raised_error_display_is_message() {
        let err = RaisedError::new("undefined offset", 8, "src/app.rs", 17);
        assert_eq!(err.to_string(), "undefined offset");
        assert_eq!(err.code, 0);
        assert_eq!(err.error_code, 8);
    }

    #[test]
    fn test_router_error_from_config() {
        let err: RouterError = ConfigError::FileNotFound.into();
        assert!(matches!(err, RouterError::Config(ConfigError::FileNotFound)));
        assert_eq!(err.to_string(), "Configuration file not found");
    }
}
