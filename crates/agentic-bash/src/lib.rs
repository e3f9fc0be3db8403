//! Bash tool server
//!
//! One MCP tool, `bash`, that runs a command line and returns everything it
//! printed. Output from failing commands is returned the same way so the
//! model can read the error.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use agentic_mcp::{McpHandler, McpTool, ToolCallResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::{debug, warn};

pub const TOOL_NAME: &str = "bash";

/// Default per-command timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// How commands are run
#[derive(Debug, Clone)]
pub struct BashConfig {
    /// Shell executable
    pub shell: String,
    pub timeout: Duration,
    /// Working directory (inherited when unset)
    pub working_dir: Option<PathBuf>,
}

impl Default for BashConfig {
    fn default() -> Self {
        Self {
            shell: "bash".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            working_dir: None,
        }
    }
}

/// Handler for the `bash` tool
#[derive(Debug, Clone, Default)]
pub struct BashTool {
    config: BashConfig,
}

impl BashTool {
    pub fn new(config: BashConfig) -> Self {
        Self { config }
    }

    fn definition() -> McpTool {
        McpTool {
            name: TOOL_NAME.to_string(),
            description: "Run a command in the Bash shell. Returns combined stdout and stderr."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The command line to execute"
                    }
                },
                "required": ["command"]
            }),
        }
    }

    /// Run `command`, returning its combined output with trailing whitespace
    /// removed. A non-zero exit status is not an error.
    pub async fn run(&self, command: &str) -> Result<String, String> {
        // Send stderr down the stdout pipe so the two stay interleaved
        let script = format!("exec 2>&1\n{}", command);

        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let output = tokio::time::timeout(self.config.timeout, cmd.output())
            .await
            .map_err(|_| format!("Command timed out after {}s", self.config.timeout.as_secs()))?
            .map_err(|e| format!("Failed to start {}: {}", self.config.shell, e))?;

        if !output.status.success() {
            debug!(status = ?output.status.code(), "Command exited unsuccessfully");
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

#[async_trait]
impl McpHandler for BashTool {
    async fn list_tools(&self) -> Vec<McpTool> {
        vec![Self::definition()]
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult, String> {
        if name != TOOL_NAME {
            return Err(format!("Unknown tool: {}", name));
        }
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| "command is required".to_string())?;

        debug!(command, "Running command");
        match self.run(command).await {
            Ok(output) => Ok(ToolCallResult::text(output)),
            Err(e) => {
                warn!(command, error = %e, "Command failed to run");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_requires_command() {
        let tool = BashTool::definition();
        assert_eq!(tool.name, "bash");
        assert_eq!(tool.input_schema["required"], json!(["command"]));
    }

    #[tokio::test]
    async fn test_missing_command_argument() {
        let err = BashTool::default().call_tool("bash", json!({})).await.unwrap_err();
        assert_eq!(err, "command is required");
    }

    #[tokio::test]
    async fn test_unknown_tool_name() {
        let err = BashTool::default()
            .call_tool("zsh", json!({ "command": "true" }))
            .await
            .unwrap_err();
        assert!(err.contains("zsh"));
    }
}
