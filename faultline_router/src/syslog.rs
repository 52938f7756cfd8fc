//! System error log.
//!
//! The `system_log` mode writes here instead of the file log. Two targets
//! exist: the POSIX syslog ([`Syslog`]) and the process's stderr
//! ([`StderrLog`]), the latter being what a host without a syslog daemon
//! (containers, CI) usually wants.

use crate::error::RouterError;
use serde::{Deserialize, Serialize};
use parking_lot::{Mutex, const_mutex};
use std::ffi::CString;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

/// Destination for system log lines.
pub trait SystemLog: Send + Sync {
    fn write(&self, line: &str) -> io::Result<()>;
}

/// Which [`SystemLog`] implementation a config selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemLogTarget {
    #[default]
    Stderr,
    Syslog,
}

impl SystemLogTarget {
    /// Open the selected system log; `ident` names the process in syslog.
    pub fn open(self, ident: &str) -> Result<Box<dyn SystemLog>, RouterError> {
        match self {
            SystemLogTarget::Stderr => Ok(Box::new(StderrLog)),
            SystemLogTarget::Syslog => Ok(Box::new(Syslog::open(ident)?)),
        }
    }
}

/// Writes each line to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLog;

impl SystemLog for StderrLog {
    fn write(&self, line: &str) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{line}")
    }
}

/// Idents of every live [`Syslog`], oldest first.
///
/// openlog(3) state is process-wide and keeps the ident pointer, so the
/// newest live ident is the one registered with libc. Entries are only
/// freed after libc has been pointed elsewhere.
static OPEN_IDENTS: Mutex<Vec<(u64, CString)>> = const_mutex(Vec::new());
static NEXT_SYSLOG_ID: AtomicU64 = AtomicU64::new(1);

/// POSIX syslog, facility `LOG_USER`, priority `LOG_ERR`.
///
/// Instances share the process's single syslog connection. The newest live
/// instance's ident is used; dropping it falls back to the next newest,
/// and closelog(3) runs when the last one goes.
#[derive(Debug)]
pub struct Syslog {
    id: u64,
    ident: String,
}

impl Syslog {
    pub fn open(ident: &str) -> Result<Self, RouterError> {
        let c_ident = CString::new(ident)
            .map_err(|e| RouterError::SystemLogOpen(format!("invalid ident: {e}")))?;
        let id = NEXT_SYSLOG_ID.fetch_add(1, Ordering::Relaxed);

        let mut idents = OPEN_IDENTS.lock();
        // SAFETY: `c_ident` is NUL-terminated; its buffer stays in
        // OPEN_IDENTS until libc no longer refers to it.
        unsafe { libc::openlog(c_ident.as_ptr(), libc::LOG_PID, libc::LOG_USER) };
        idents.push((id, c_ident));

        Ok(Self {
            id,
            ident: ident.to_string(),
        })
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }
}

impl SystemLog for Syslog {
    fn write(&self, line: &str) -> io::Result<()> {
        let message = to_c_message(line);
        // SAFETY: both pointers are valid NUL-terminated strings; the fixed
        // "%s" format keeps `line` from being interpreted.
        unsafe { libc::syslog(libc::LOG_ERR, c"%s".as_ptr(), message.as_ptr()) };
        Ok(())
    }
}

impl Drop for Syslog {
    fn drop(&mut self) {
        let mut idents = OPEN_IDENTS.lock();
        let Some(index) = idents.iter().position(|(id, _)| *id == self.id) else {
            return;
        };
        let removed = idents.remove(index);
        match idents.last() {
            // SAFETY: the remaining ident is owned by OPEN_IDENTS.
            Some((_, ident)) => unsafe {
                libc::openlog(ident.as_ptr(), libc::LOG_PID, libc::LOG_USER)
            },
            // SAFETY: closelog has no preconditions.
            None => unsafe { libc::closelog() },
        }
        drop(removed);
    }
}

#[cfg(test)]
fn live_idents() -> Vec<String> {
    OPEN_IDENTS
        .lock()
        .iter()
        .map(|(_, ident)| ident.to_string_lossy().into_owned())
        .collect()
}

fn to_c_message(line: &str) -> CString {
    let bytes: Vec<u8> = line.bytes().filter(|&b| b != 0).collect();
    // NULs were just removed.
    CString::new(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_c_message_strips_nul() {
        let message = to_c_message("a\0b");
        assert_eq!(message.as_bytes(), b"ab");
    }

    #[test]
    fn test_target_default_is_stderr() {
        assert_eq!(SystemLogTarget::default(), SystemLogTarget::Stderr);
    }

    #[test]
    fn test_syslog_rejects_nul_ident() {
        assert!(matches!(
            Syslog::open("bad\0ident"),
            Err(RouterError::SystemLogOpen(_))
        ));
    }

    #[test]
    fn test_syslog_instances_share_connection() {
        let outer = Syslog::open("faultline-outer").unwrap();
        let inner = Syslog::open("faultline-inner").unwrap();
        assert_eq!(inner.ident(), "faultline-inner");

        drop(inner);
        let live = live_idents();
        assert!(live.contains(&"faultline-outer".to_string()), "live: {live:?}");
        assert!(!live.contains(&"faultline-inner".to_string()), "live: {live:?}");
        assert!(outer.write("ERROR, FILE:a.rs:1, ERRNO:0, after inner dropped").is_ok());

        drop(outer);
        assert!(!live_idents().contains(&"faultline-outer".to_string()));
    }

    #[test]
    fn test_stderr_write() {
        assert!(StderrLog.write("ERROR, FILE:a.rs:1, ERRNO:0, test line").is_ok());
    }
}
