//! # Hook Registry
//!
//! Binds one [`ErrorRouter`] to the three process-wide interception points
//! and owns what it displaced:
//!
//! 1. the panic hook (the previous hook is kept and restored on teardown),
//! 2. a runtime-error hook on the [`host`](crate::host) stack,
//! 3. an exit hook that dispatches the last fatal record as SHUTDOWN.
//!
//! The registry is an ordinary value owned by the host's composition root.
//! Dropping it tears the hooks down.
//!
//! # THROW mode
//!
//! A [`RaisedError`](crate::RaisedError) produced from the panic hook cannot
//! be raised again: a panic inside a panic hook aborts the process. The
//! registry logs it and chains to the previous panic hook, so the panic
//! continues with the process's normal top-level behaviour. At exit the
//! raised error is printed to stderr and the exit proceeds. Runtime errors
//! are the only interception point where THROW reaches the caller.

use crate::error::RegistryError;
use crate::host::{self, HookId, RuntimeError};
use crate::router::ErrorRouter;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static;

pub struct HookRegistry {
    router: Arc<ErrorRouter>,
    previous_panic_hook: Option<Arc<PanicHook>>,
    // Cleared on teardown; the installed panic hook then only forwards.
    panic_hook_active: Arc<AtomicBool>,
    error_hook: Option<HookId>,
    exit_hook: Option<HookId>,
}

impl HookRegistry {
    /// Install all three hooks for `router`.
    ///
    /// On failure every hook installed so far is removed again.
    pub fn install(router: Arc<ErrorRouter>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            router,
            previous_panic_hook: None,
            panic_hook_active: Arc::new(AtomicBool::new(false)),
            error_hook: None,
            exit_hook: None,
        };

        registry.install_panic_hook();
        registry.install_error_hook();
        // Dropping the partial registry tears it down.
        registry.install_exit_hook()?;

        tracing::debug!(mode = %registry.router.mode(), "Error hooks installed");
        Ok(registry)
    }

    pub fn router(&self) -> &Arc<ErrorRouter> {
        &self.router
    }

    pub fn is_installed(&self) -> bool {
        self.previous_panic_hook.is_some() || self.error_hook.is_some() || self.exit_hook.is_some()
    }

    /// Remove the hooks and restore the previous panic hook. Idempotent.
    ///
    /// The panic hook is replaced outright, including any hook installed
    /// on top of this registry's since. During unwinding the panic hook
    /// cannot be swapped, so this registry's hook stays installed but
    /// forwards every later panic to the previous hook.
    pub fn teardown(&mut self) {
        if !self.is_installed() {
            return;
        }

        if let Some(id) = self.error_hook.take() {
            host::remove_error_hook(id);
        }
        if let Some(id) = self.exit_hook.take() {
            host::remove_exit_hook(id);
        }
        if let Some(previous) = self.previous_panic_hook.take() {
            self.panic_hook_active.store(false, Ordering::Release);
            if std::thread::panicking() {
                tracing::debug!("Teardown during unwinding, panic hook now forwards");
            } else {
                panic::set_hook(Box::new(move |info| previous(info)));
            }
        }

        tracing::debug!(mode = %self.router.mode(), "Error hooks removed");
    }

    fn install_panic_hook(&mut self) {
        let previous: Arc<PanicHook> = Arc::from(panic::take_hook());
        let chained = Arc::clone(&previous);
        let router = Arc::clone(&self.router);
        let active = Arc::clone(&self.panic_hook_active);
        active.store(true, Ordering::Release);

        panic::set_hook(Box::new(move |info| {
            if !active.load(Ordering::Acquire) {
                chained(info);
                return;
            }
            if let Err(raised) = router.handle_panic(info) {
                tracing::error!(
                    error_code = raised.error_code,
                    file = %raised.file,
                    line = raised.line,
                    "Panic escalated in throw mode: {raised}"
                );
                chained(info);
            }
        }));

        self.previous_panic_hook = Some(previous);
    }

    fn install_error_hook(&mut self) {
        let router = Arc::clone(&self.router);
        self.error_hook = Some(host::push_error_hook(Arc::new(
            move |error: &RuntimeError| router.handle_error(error),
        )));
    }

    fn install_exit_hook(&mut self) -> Result<(), RegistryError> {
        let router = Arc::clone(&self.router);
        let id = host::push_exit_hook(Box::new(move || {
            if let Err(raised) = router.handle_shutdown(host::take_last_fatal()) {
                tracing::error!(file = %raised.file, line = raised.line, "Fatal error at exit: {raised}");
                eprintln!(
                    "Uncaught fatal error at exit: {} in {}:{}",
                    raised.message, raised.file, raised.line
                );
            }
        }))?;
        self.exit_hook = Some(id);
        Ok(())
    }
}

impl Drop for HookRegistry {
    fn drop(&mut self) {
        self.teardown();
    }
}
