//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over the operations the
//! cache needs from the host system, enabling dependency injection and
//! testability.
//!
//! # Structure
//!
//! - `env` - Configuration directory and file lookups
//! - `process` - Running the metadata helper as a subprocess

mod env;
mod process;

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A program and its arguments, passed without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;

    // Directories
    fn config_dir(&self) -> Option<PathBuf>;

    // Processes
    /// Run `command` to completion, capturing stdout and stderr.
    /// The child is killed and a `CacheError::Timeout` returned when it runs
    /// longer than `timeout`.
    /// Blocks the calling thread; safe to call from inside a tokio runtime.
    fn run_command(&self, command: &CommandLine, timeout: Duration) -> Result<CommandOutput>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir_impl()
    }

    fn run_command(&self, command: &CommandLine, timeout: Duration) -> Result<CommandOutput> {
        self.run_command_impl(command, timeout)
    }
}
