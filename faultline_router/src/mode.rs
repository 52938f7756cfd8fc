//! Router modes and log severities.

use crate::error::RouterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policy selecting which sink handles every event for a router's lifetime.
///
/// Deserializes from the integer codes `0..=3` or from snake_case names.
/// Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "ModeRepr")]
pub enum RouterMode {
    /// Leveled line in the file log (code 0).
    #[default]
    LogFile,
    /// Line in the system error log (code 1).
    SystemLog,
    /// Surface a [`RaisedError`](crate::RaisedError) to the caller (code 2).
    Throw,
    /// File log plus the custom handler (code 3).
    LogFileAndCustom,
}

impl RouterMode {
    pub const ALL: [RouterMode; 4] = [
        RouterMode::LogFile,
        RouterMode::SystemLog,
        RouterMode::Throw,
        RouterMode::LogFileAndCustom,
    ];

    /// Integer code of the mode.
    pub fn code(self) -> i64 {
        match self {
            RouterMode::LogFile => 0,
            RouterMode::SystemLog => 1,
            RouterMode::Throw => 2,
            RouterMode::LogFileAndCustom => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RouterMode::LogFile => "log_file",
            RouterMode::SystemLog => "system_log",
            RouterMode::Throw => "throw",
            RouterMode::LogFileAndCustom => "log_file_and_custom",
        }
    }

    /// Whether this mode writes to the file log.
    pub fn uses_log_sink(self) -> bool {
        matches!(self, RouterMode::LogFile | RouterMode::LogFileAndCustom)
    }
}

impl fmt::Display for RouterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for RouterMode {
    type Error = RouterError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        RouterMode::ALL
            .into_iter()
            .find(|mode| mode.code() == code)
            .ok_or_else(|| RouterError::InvalidMode(code.to_string()))
    }
}

impl FromStr for RouterMode {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return RouterMode::try_from(code);
        }
        RouterMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RouterError::InvalidMode(s.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<ModeRepr> for RouterMode {
    type Error = RouterError;

    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        match repr {
            ModeRepr::Code(code) => RouterMode::try_from(code),
            ModeRepr::Name(name) => name.parse(),
        }
    }
}

/// Severity of a line in the file log, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Warning,
    Error,
    Emergency,
}

impl Severity {
    /// Label written into the file log.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
            Severity::Emergency => "EMER",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_codes() {
        for (code, mode) in RouterMode::ALL.into_iter().enumerate() {
            assert_eq!(mode.code(), code as i64);
            assert_eq!(RouterMode::try_from(code as i64).unwrap(), mode);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(matches!(
            RouterMode::try_from(4),
            Err(RouterError::InvalidMode(v)) if v == "4"
        ));
        assert!(RouterMode::try_from(-1).is_err());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("system_log".parse::<RouterMode>().unwrap(), RouterMode::SystemLog);
        assert_eq!("THROW".parse::<RouterMode>().unwrap(), RouterMode::Throw);
        assert_eq!("3".parse::<RouterMode>().unwrap(), RouterMode::LogFileAndCustom);
        assert!("rethrow".parse::<RouterMode>().is_err());
    }

    #[test]
    fn test_mode_uses_log_sink() {
        assert!(RouterMode::LogFile.uses_log_sink());
        assert!(RouterMode::LogFileAndCustom.uses_log_sink());
        assert!(!RouterMode::SystemLog.uses_log_sink());
        assert!(!RouterMode::Throw.uses_log_sink());
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Emergency);
        assert_eq!(Severity::default(), Severity::Warning);
    }
}
