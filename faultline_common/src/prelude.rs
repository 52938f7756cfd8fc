//! Prelude module for common re-exports.
//!
//! So that consumers can do `use faultline_common::prelude::*;` and get
//! the most important types without listing individual paths.

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── Defaults ───────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_FACILITY, DEFAULT_LOG_SUBDIR};
