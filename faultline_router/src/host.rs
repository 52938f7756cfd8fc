//! Process runtime bindings.
//!
//! Rust has a native hook only for panics. This module supplies the other
//! two interception points a router binds to:
//!
//! - **Runtime-error hooks**: a stack of handlers fed by [`raise_error`]
//!   (or the [`raise_error!`](crate::raise_error) macro). The most recently
//!   pushed hook handles the error. With no hook installed the error is
//!   reported through `tracing` and kept as the last fatal record.
//! - **Exit hooks**: closures run once at process exit, driven by a single
//!   `atexit(3)` trampoline.
//!
//! Plus the "last fatal error" record queried by the exit hook.
//!
//! All tables are process-global. No lock is held while a hook runs.

use crate::error::{RaisedError, RegistryError};
use parking_lot::{Mutex, const_mutex};
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies a hook pushed onto one of the hook tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// An error reported through the runtime-error hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub code: i64,
    pub message: String,
    pub file: String,
    pub line: u32,
}

/// The last fatal error recorded before exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalRecord {
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl FatalRecord {
    pub fn new(message: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            file: file.into(),
            line,
        }
    }
}

impl From<&RuntimeError> for FatalRecord {
    fn from(error: &RuntimeError) -> Self {
        FatalRecord::new(error.message.clone(), error.file.clone(), error.line)
    }
}

pub type ErrorHook = Arc<dyn Fn(&RuntimeError) -> Result<(), RaisedError> + Send + Sync>;
pub type ExitHook = Box<dyn FnOnce() + Send>;

static NEXT_HOOK_ID: AtomicU64 = AtomicU64::new(1);
static ERROR_HOOKS: Mutex<Vec<(HookId, ErrorHook)>> = const_mutex(Vec::new());
static EXIT_HOOKS: Mutex<Vec<(HookId, ExitHook)>> = const_mutex(Vec::new());
static LAST_FATAL: Mutex<Option<FatalRecord>> = const_mutex(None);

fn next_hook_id() -> HookId {
    HookId(NEXT_HOOK_ID.fetch_add(1, Ordering::Relaxed))
}

// ─── Runtime-error hooks ────────────────────────────────────────────

/// Push a runtime-error hook; it shadows every hook pushed before it.
pub fn push_error_hook(hook: ErrorHook) -> HookId {
    let id = next_hook_id();
    ERROR_HOOKS.lock().push((id, hook));
    id
}

/// Remove a previously pushed error hook. Returns `false` if it was not
/// installed.
pub fn remove_error_hook(id: HookId) -> bool {
    let mut hooks = ERROR_HOOKS.lock();
    match hooks.iter().position(|(hook_id, _)| *hook_id == id) {
        Some(index) => {
            drop(hooks.remove(index));
            true
        }
        None => false,
    }
}

pub fn error_hook_count() -> usize {
    ERROR_HOOKS.lock().len()
}

/// Report a runtime error.
///
/// The topmost error hook decides the outcome; a router in THROW mode
/// returns the error here for the caller to propagate. With no hook
/// installed the error is logged and recorded as the last fatal error.
pub fn raise_error(
    code: i64,
    message: impl Into<String>,
    file: impl Into<String>,
    line: u32,
) -> Result<(), RaisedError> {
    let error = RuntimeError {
        code,
        message: message.into(),
        file: file.into(),
        line,
    };

    let hook = ERROR_HOOKS.lock().last().map(|(_, hook)| Arc::clone(hook));
    match hook {
        Some(hook) => hook(&error),
        None => {
            tracing::warn!(
                code = error.code,
                file = %error.file,
                line = error.line,
                "Unhandled runtime error: {}",
                error.message
            );
            record_fatal(FatalRecord::from(&error));
            Ok(())
        }
    }
}

/// Report a runtime error at the call site.
///
/// ```rust
/// use faultline_router::raise_error;
///
/// fn lookup(index: usize) -> Result<(), faultline_router::RaisedError> {
///     raise_error!(8, "undefined offset {index}")?;
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! raise_error {
    ($code:expr, $($arg:tt)+) => {
        $crate::host::raise_error($code, ::std::format!($($arg)+), ::std::file!(), ::std::line!())
    };
}

// ─── Last fatal record ──────────────────────────────────────────────

/// Record a fatal error; replaces any earlier record.
pub fn record_fatal(record: FatalRecord) {
    *LAST_FATAL.lock() = Some(record);
}

pub fn last_fatal() -> Option<FatalRecord> {
    LAST_FATAL.lock().clone()
}

/// Take the last fatal record, leaving none behind.
pub fn take_last_fatal() -> Option<FatalRecord> {
    LAST_FATAL.lock().take()
}

/// Record a fatal error at the call site.
#[macro_export]
macro_rules! record_fatal {
    ($($arg:tt)+) => {
        $crate::host::record_fatal($crate::host::FatalRecord::new(
            ::std::format!($($arg)+),
            ::std::file!(),
            ::std::line!(),
        ))
    };
}

// ─── Exit hooks ─────────────────────────────────────────────────────

/// Register a closure to run once at process exit.
///
/// The first registration installs the `atexit(3)` trampoline.
pub fn push_exit_hook(hook: ExitHook) -> Result<HookId, RegistryError> {
    if !ensure_atexit() {
        return Err(RegistryError::ExitHook);
    }
    let id = next_hook_id();
    EXIT_HOOKS.lock().push((id, hook));
    Ok(id)
}

/// Unregister an exit hook that has not run yet.
pub fn remove_exit_hook(id: HookId) -> bool {
    let mut hooks = EXIT_HOOKS.lock();
    match hooks.iter().position(|(hook_id, _)| *hook_id == id) {
        Some(index) => {
            drop(hooks.remove(index));
            true
        }
        None => false,
    }
}

pub fn exit_hook_count() -> usize {
    EXIT_HOOKS.lock().len()
}

/// Run and drain all registered exit hooks, most recent first.
///
/// Called by the `atexit` trampoline. Hosts that leave through a path
/// which skips `exit(3)` can call it directly.
pub fn run_exit_hooks() {
    loop {
        let next = EXIT_HOOKS.lock().pop();
        match next {
            Some((_, hook)) => hook(),
            None => break,
        }
    }
}

extern "C" fn exit_trampoline() {
    // Unwinding out of an extern "C" fn aborts.
    if std::panic::catch_unwind(run_exit_hooks).is_err() {
        tracing::error!("Exit hook panicked");
    }
}

fn ensure_atexit() -> bool {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    // SAFETY: the trampoline is a plain extern "C" fn with no captured state.
    *REGISTERED.get_or_init(|| unsafe { libc::atexit(exit_trampoline) } == 0)
}
