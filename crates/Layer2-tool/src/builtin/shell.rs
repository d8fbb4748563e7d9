//! Shell tool - command execution
//!
//! Runs a shell command and captures its output.
//! - Timeout support with forced kill
//! - Output size cap
//! - Optional working directory override

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use moon_foundation::{Error, Result, Tool, ToolContext, ToolResult, ToolSchema};

/// Shell tool input
#[derive(Debug, Deserialize)]
pub struct ShellInput {
    /// Command to execute
    pub command: String,

    /// Brief description of the command's purpose
    #[serde(default)]
    pub description: Option<String>,

    /// Directory to run the command in (defaults to the context working dir)
    #[serde(default)]
    pub dir_path: Option<String>,

    /// Timeout in milliseconds (default: 120000 = 2 minutes, max: 600000)
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Shell tool
pub struct ShellTool;

impl ShellTool {
    pub fn new() -> Self {
        Self
    }

    /// Tool name
    pub const NAME: &'static str = "run_shell_command";

    /// Default timeout (2 minutes)
    const DEFAULT_TIMEOUT_MS: u64 = 120_000;

    /// Maximum timeout (10 minutes)
    const MAX_TIMEOUT_MS: u64 = 600_000;

    /// Maximum captured size per stream (30KB)
    const MAX_OUTPUT_SIZE: usize = 30_000;

    fn cap_output(raw: &[u8]) -> String {
        let mut text = String::from_utf8_lossy(raw).into_owned();
        if text.len() > Self::MAX_OUTPUT_SIZE {
            // The cap may land inside a multibyte character; back up to the
            // nearest char boundary before cutting.
            let mut cut = Self::MAX_OUTPUT_SIZE;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
            text.push_str("\n... [output truncated]");
        }
        text
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            Self::NAME,
            "Execute shell commands with safety checks and output capture",
        )
        .with_string_param("command", "The shell command to execute", true)
        .with_string_param("description", "Brief description of the command's purpose", true)
        .with_string_param("dir_path", "Optional directory path to run the command in", false)
        .with_integer_param("timeout", "Optional timeout in milliseconds (max 600000)", false)
    }

    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let parsed: ShellInput = serde_json::from_value(args)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;

        if parsed.command.trim().is_empty() {
            return Ok(ToolResult::err("Command cannot be empty"));
        }

        if let Some(desc) = &parsed.description {
            debug!("Executing: {}", desc);
        }
        debug!("Command: {}", parsed.command);

        // Resolve and validate the working directory
        let cwd = match &parsed.dir_path {
            Some(dir) => ctx.resolve(dir),
            None => ctx.working_dir.clone(),
        };
        if !cwd.is_dir() {
            return Ok(ToolResult::err(format!(
                "Directory does not exist: {}",
                cwd.display()
            )));
        }

        let timeout_ms = parsed
            .timeout
            .unwrap_or(Self::DEFAULT_TIMEOUT_MS)
            .min(Self::MAX_TIMEOUT_MS);

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&parsed.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&parsed.command);
            c
        };

        cmd.current_dir(&cwd);
        for (key, value) in &ctx.env {
            cmd.env(key, value);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                return Ok(ToolResult::err(format!("Failed to spawn process: {}", e)));
            }
        };

        let output = match timeout(Duration::from_millis(timeout_ms), child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Ok(ToolResult::err(format!("Process error: {}", e)));
            }
            Err(_) => {
                return Ok(ToolResult::err(format!(
                    "Command timed out after {} ms",
                    timeout_ms
                )));
            }
        };

        let stdout = Self::cap_output(&output.stdout);
        let stderr = Self::cap_output(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);
        let success = output.status.success();

        let directory = cwd.display().to_string();
        let data = json!({
            "stdout": if stdout.is_empty() { "(empty)" } else { stdout.as_str() },
            "stderr": if stderr.is_empty() { "(empty)" } else { stderr.as_str() },
            "exit_code": exit_code,
            "command": parsed.command,
            "directory": directory,
        });

        let result = if success {
            ToolResult::ok(data)
        } else {
            let mut r = ToolResult::err(if stderr.is_empty() {
                format!("Command failed with exit code {}", exit_code)
            } else {
                stderr.clone()
            });
            r.data = Some(data);
            r
        };

        Ok(result
            .with_metadata("exit_code", json!(exit_code))
            .with_metadata("executed_in", json!(directory))
            .with_metadata("command", json!(parsed.command)))
    }
}

// ============================================================================
// Tests
// ============================================================================
