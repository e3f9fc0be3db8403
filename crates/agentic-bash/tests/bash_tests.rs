//! Tests for the bash tool
//!
//! These run real `bash` processes.

#![cfg(unix)]

use std::time::Duration;

use agentic_bash::{BashConfig, BashTool};
use agentic_mcp::McpHandler;
use serde_json::json;

mod bash_tool_tests {
    use super::*;

    async fn run(command: &str) -> agentic_mcp::ToolCallResult {
        BashTool::default()
            .call_tool("bash", json!({ "command": command }))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_echo_trims_trailing_whitespace() {
        let result = run("echo hello; echo; echo").await;
        assert!(!result.is_error);
        assert_eq!(result.joined_text(), "hello");
    }

    #[tokio::test]
    async fn test_stderr_is_merged_in_order() {
        let result = run("echo out; echo err >&2; echo out2").await;
        assert_eq!(result.joined_text(), "out\nerr\nout2");
    }

    #[tokio::test]
    async fn test_failing_command_still_returns_output() {
        let result = run("ls /definitely/not/here-9731").await;
        assert!(!result.is_error);
        assert!(result.joined_text().contains("/definitely/not/here-9731"));
    }

    #[tokio::test]
    async fn test_silent_command_returns_empty_text() {
        let result = run("true").await;
        assert_eq!(result.joined_text(), "");
    }

    #[tokio::test]
    async fn test_multiline_command() {
        let result = run("for i in 1 2 3; do\n  echo $i\ndone").await;
        assert_eq!(result.joined_text(), "1\n2\n3");
    }

    #[tokio::test]
    async fn test_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let tool = BashTool::new(BashConfig {
            working_dir: Some(dir.path().to_path_buf()),
            ..BashConfig::default()
        });
        let result = tool.call_tool("bash", json!({ "command": "ls" })).await.unwrap();
        assert_eq!(result.joined_text(), "marker.txt");
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let tool = BashTool::new(BashConfig {
            timeout: Duration::from_millis(200),
            ..BashConfig::default()
        });
        let err = tool.run("sleep 5").await.unwrap_err();
        assert!(err.contains("timed out"), "got {err}");
    }
}
