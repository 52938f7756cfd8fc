//! # faultline Router
//!
//! Process-wide error interception. Panics, runtime errors reported through
//! [`raise_error!`] and fatal records pending at exit are normalized into
//! [`ErrorEvent`]s and handled by one [`ErrorRouter`] according to its
//! [`RouterMode`].
//!
//! # Module Structure
//!
//! - [`router`] - Dispatch policy and hook adapters
//! - [`registry`] - Installs and restores the process-wide hooks
//! - [`host`] - Runtime-error hook stack, exit hooks, last fatal record
//! - [`event`] - Normalized events and panic payloads
//! - [`mode`] - Router modes and log severities
//! - [`sink`] - File log
//! - [`syslog`] - System log
//! - [`config`] - `[router]` TOML configuration
//!
//! # Usage
//!
//! ```rust,no_run
//! use faultline_router::{ErrorRouter, HookRegistry, RouterMode};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let router = ErrorRouter::new(RouterMode::LogFile, Some(Path::new("/var/log/app")))?;
//! let _hooks = HookRegistry::install(Arc::new(router))?;
//!
//! faultline_router::raise_error!(8, "undefined offset {}", 3)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod mode;
pub mod registry;
pub mod router;
pub mod sink;
pub mod syslog;

pub use config::{RouterConfig, RouterSection};
pub use error::{RaisedError, RegistryError, RouterError};
pub use event::{ErrorEvent, ErrorKind, Exception, PanicRecord};
pub use host::{FatalRecord, RuntimeError};
pub use mode::{RouterMode, Severity};
pub use registry::HookRegistry;
pub use router::{CustomHandler, ErrorRouter, NoopHandler, RouterBuilder};
pub use sink::{FileLogger, LogSink};
pub use syslog::{StderrLog, SystemLog, SystemLogTarget, Syslog};
