//! External tool execution.

use crate::error::{PipelineError, Result};
use crate::tool::ToolInvocation;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

/// Captured result of a tool that exited successfully.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Tool name.
    pub tool: String,

    /// Exit code (0 = success).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

/// Executes tool invocations.
///
/// Implementations must return `CommandExecution` for a non-zero exit, so a
/// successful `Ok` always means the tool did its job.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

/// Runs tools as child processes and waits for them to exit.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Timeout in seconds (0 = wait indefinitely).
    pub timeout_secs: u64,
}

impl ProcessRunner {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let start = Instant::now();
        let command = invocation.to_string();
        info!(tool = invocation.tool, "Running Command: {}", command);

        let child = Command::new(&invocation.program)
            .args(invocation.process_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                program: invocation.program.display().to_string(),
                source,
            })?;

        let output = if self.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(self.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| PipelineError::Timeout {
                command: command.clone(),
                secs: self.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        log_captured(invocation.tool, &stdout, &stderr);

        if !output.status.success() {
            return Err(PipelineError::CommandExecution {
                command,
                code: exit_code,
                output: failure_output(&stdout, &stderr),
            });
        }

        debug!(tool = invocation.tool, duration_ms, "Command finished");
        Ok(ToolOutput {
            tool: invocation.tool.to_string(),
            exit_code,
            stdout,
            stderr,
            duration_ms,
        })
    }
}

/// Stdout goes to the log on every invocation, whatever the outcome.
fn log_captured(tool: &str, stdout: &str, stderr: &str) {
    let stdout = stdout.trim_end();
    if !stdout.is_empty() {
        info!(tool, "{}", stdout);
    }
    let stderr = stderr.trim_end();
    if !stderr.is_empty() {
        debug!(tool, stderr = %stderr, "Captured stderr");
    }
}

/// Prefer stderr for the error message; some tools only print to stdout.
fn failure_output(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        stdout.trim().to_string()
    } else {
        stderr.to_string()
    }
}
