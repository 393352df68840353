//! Error types for metadata refreshes.

use std::fmt;
use std::time::Duration;

/// Failures surfaced to callers of the cache.
///
/// These travel inside `anyhow::Error` and can be recovered with
/// `downcast_ref::<CacheError>()`.
#[derive(Debug)]
pub enum CacheError {
    /// The metadata helper exited with a non-zero status.
    Metadata {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    /// The metadata helper did not finish in time and was killed.
    Timeout { command: String, timeout: Duration },
    /// A parsing or construction function was called with the wrong shape
    /// of arguments.
    Argument(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Metadata {
                command,
                status,
                stderr,
            } => {
                let status = status
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                write!(
                    f,
                    "{} exited with status {}, returned:\n{}",
                    command, status, stderr
                )
            }
            CacheError::Timeout { command, timeout } => {
                write!(f, "{} timed out after {}s", command, timeout.as_secs())
            }
            CacheError::Argument(msg) => write!(f, "Invalid arguments: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

/// A metadata line that could not be understood.
///
/// Warnings are logged and the line is skipped; they never abort a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    pub line: String,
    pub reason: String,
}

impl ParseWarning {
    pub fn new(line: &str, reason: impl Into<String>) -> Self {
        Self {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Problem parsing line '{}' from yum-dump.py! ({}) Please check your yum configuration.",
            self.line, self.reason
        )
    }
}
