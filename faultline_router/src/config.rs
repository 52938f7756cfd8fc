//! Router configuration.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "billing-worker"
//!
//! [router]
//! mode = "log_file"        # or 0..=3
//! log_dir = "/var/log/billing"
//! verbosity = "warning"    # warning | error | emergency
//! facility = "billing"
//! system_log = "stderr"    # stderr | syslog
//! ```

use crate::mode::{RouterMode, Severity};
use crate::syslog::SystemLogTarget;
use faultline::config::{ConfigError, SharedConfig};
use faultline::consts::DEFAULT_FACILITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration of a host using the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub shared: SharedConfig,

    #[serde(default)]
    pub router: RouterSection,
}

impl RouterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.router.validate()
    }
}

/// The `[router]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterSection {
    #[serde(default)]
    pub mode: RouterMode,

    /// Directory of the file log; `log/` beside the executable when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Lowest severity written to the file log.
    #[serde(default)]
    pub verbosity: Severity,

    /// File log stem and syslog ident.
    #[serde(default = "default_facility")]
    pub facility: String,

    #[serde(default)]
    pub system_log: SystemLogTarget,
}

fn default_facility() -> String {
    DEFAULT_FACILITY.to_string()
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            mode: RouterMode::default(),
            log_dir: None,
            verbosity: Severity::default(),
            facility: default_facility(),
            system_log: SystemLogTarget::default(),
        }
    }
}

impl RouterSection {
    /// # Errors
    ///
    /// `ConfigError::ValidationError` if `facility` is empty or is not a
    /// single path component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.facility.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "router.facility cannot be empty".to_string(),
            ));
        }
        if self.facility.contains(['/', '\\', '\0']) {
            return Err(ConfigError::ValidationError(format!(
                "router.facility must be a plain name, got {:?}",
                self.facility
            )));
        }
        Ok(())
    }
}
