//! Workspace-wide constants.
//!
//! Single source of truth for default paths and names.

/// Name of the log subdirectory created beside the executable when no
/// log directory is configured.
pub const DEFAULT_LOG_SUBDIR: &str = "log";

/// Default facility name: file stem of the file log and syslog ident.
pub const DEFAULT_FACILITY: &str = "faultline";

/// Extension appended to the facility name for the file log.
pub const LOG_FILE_EXTENSION: &str = "log";

/// Timestamp format used by the file log.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
