//! Subprocess execution with a deadline.

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::process::Stdio;
use std::time::Duration;

use super::{CommandLine, CommandOutput, RealRuntime};
use crate::error::CacheError;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn run_command_impl(
        &self,
        command: &CommandLine,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        // block_on panics on a thread that already drives a runtime
        if tokio::runtime::Handle::try_current().is_ok() {
            debug!("Inside a tokio runtime, running {} on a separate thread", command);
            return std::thread::scope(|scope| {
                scope
                    .spawn(|| block_on_command(command, timeout))
                    .join()
                    .map_err(|_| anyhow!("Subprocess thread for {} panicked", command))?
            });
        }
        block_on_command(command, timeout)
    }
}

fn block_on_command(command: &CommandLine, timeout: Duration) -> Result<CommandOutput> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start subprocess runtime")?;

    rt.block_on(run_with_timeout(command, timeout))
}

async fn run_with_timeout(command: &CommandLine, timeout: Duration) -> Result<CommandOutput> {
    debug!("Running {}", command);
    let child = tokio::process::Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to run {}", command))?;

    // Dropping the child on timeout kills it
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output.with_context(|| format!("Failed to wait for {}", command))?,
        Err(_) => {
            return Err(CacheError::Timeout {
                command: command.to_string(),
                timeout,
            }
            .into());
        }
    };

    debug!("{} exited with {:?}", command, output.status.code());
    Ok(CommandOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
