//! Toolchain process execution

use std::collections::HashMap;
use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::error::{BuildError, Result};

/// Captured output of a finished tool invocation
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Last lines of stderr (or stdout when stderr is empty), for error messages
    pub fn tail(&self, lines: usize) -> String {
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let all: Vec<&str> = text.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }

    /// Lines that look like toolchain warnings
    pub fn warnings(&self) -> Vec<String> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .filter(|l| l.starts_with("w: ") || l.starts_with("warning:") || l.contains(" warning: "))
            .map(str::to_string)
            .collect()
    }
}

/// Run a tool to completion with the config env overlay applied
pub(crate) async fn run_tool(
    program: &Path,
    args: &[String],
    cwd: &Path,
    env: &HashMap<String, String>,
) -> Result<ToolOutput> {
    let command_line = format!("{} {}", program.display(), args.join(" "));
    debug!(command = %command_line, cwd = %cwd.display(), "running tool");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(env)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| BuildError::CommandFailed {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

    debug!(command = %command_line, status = ?output.status.code(), "tool finished");

    Ok(ToolOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
