//! `shell` — execute a command through the system shell.
//!
//! The command runs via `bash -c`, or `sh -c` where bash is not installed
//! (`cmd /C` on Windows). The result is stdout
//! followed by stderr. A non-zero exit status is a failure that still
//! carries whatever the command printed.

use std::io::ErrorKind;
use std::process::Output;

use async_trait::async_trait;
use sous_core::error::ToolError;
use sous_core::tool::{ParameterSchema, Tool, ToolArgs};
use tokio::process::Command;
use tracing::{debug, warn};

pub struct ShellTool;

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its combined stdout/stderr. Use this for running programs, git operations, builds, etc."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required("command", "The shell command to execute")
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let command = args.string("command")?;

        debug!(command = %command, "Executing shell command");

        let output = if cfg!(target_os = "windows") {
            Command::new("cmd").args(["/C", command]).output().await
        } else {
            run_posix(command).await
        }
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: "shell".into(),
            reason: e.to_string(),
            output: String::new(),
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            warn!(command = %command, status = %output.status, "Command failed");
            Err(ToolError::ExecutionFailed {
                tool_name: "shell".into(),
                reason: output.status.to_string(),
                output: combined,
            })
        }
    }
}

async fn run_posix(command: &str) -> std::io::Result<Output> {
    match Command::new("bash").args(["-c", command]).output().await {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("bash not found, falling back to sh");
            Command::new("sh").args(["-c", command]).output().await
        }
        other => other,
    }
}
