//! MCP Transport layer implementations

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

/// How long a provider gets to exit after its stdin closes before it is killed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Transport trait for MCP communication
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, message: Value) -> io::Result<()>;
    async fn receive(&mut self) -> io::Result<Option<Value>>;
    async fn close(&mut self) -> io::Result<()>;
}

/// Write one JSON message followed by a newline
async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, message: &Value) -> io::Result<()> {
    let json = serde_json::to_string(message)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

/// Read the next non-blank line and parse it as JSON. `None` on EOF.
async fn read_line<R: AsyncBufReadExt + Unpin>(reader: &mut R) -> io::Result<Option<Value>> {
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        // A truncated line reports an EOF kind from serde_json; it is still bad data
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        return Ok(Some(value));
    }
}

/// Stdio transport for subprocess communication
pub struct StdioTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    reader: BufReader<ChildStdout>,
}

impl StdioTransport {
    /// Spawn `command` with `args`, adding `env` on top of the inherited
    /// environment. The child is killed if the transport is dropped.
    pub fn spawn(command: &str, args: &[String], env: &HashMap<String, String>) -> io::Result<Self> {
        let mut child = Command::new(command)
            .args(args)
            .envs(env)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            io::Error::other("Failed to capture stdin")
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            io::Error::other("Failed to capture stdout")
        })?;

        debug!(command, pid = ?child.id(), "Spawned tool provider");

        Ok(Self {
            child,
            stdin: Some(stdin),
            reader: BufReader::new(stdout),
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&mut self, message: Value) -> io::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "Stdin already closed")
        })?;
        write_line(stdin, &message).await
    }

    async fn receive(&mut self) -> io::Result<Option<Value>> {
        read_line(&mut self.reader).await
    }

    async fn close(&mut self) -> io::Result<()> {
        // Closing stdin is the polite shutdown signal for stdio servers
        drop(self.stdin.take());

        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(?status, "Tool provider exited");
                Ok(())
            }
            Err(_) => {
                warn!(pid = ?self.child.id(), "Tool provider did not exit, killing it");
                self.child.kill().await
            }
        }
    }
}

/// Transport over an arbitrary reader/writer pair, e.g. the server's own
/// stdin/stdout or an in-memory duplex in tests.
pub struct StreamTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }
}

impl StreamTransport<tokio::io::Stdin, tokio::io::Stdout> {
    /// Transport over this process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

#[async_trait]
impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: Value) -> io::Result<()> {
        write_line(&mut self.writer, &message).await
    }

    async fn receive(&mut self) -> io::Result<Option<Value>> {
        read_line(&mut self.reader).await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_stream_transport_skips_blank_lines() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, mut server_write) = tokio::io::split(server);
        let (client_read, client_write) = tokio::io::split(client);
        drop(server_read);

        server_write.write_all(b"\n  \n{\"a\":1}\n").await.unwrap();
        drop(server_write);

        let mut transport = StreamTransport::new(client_read, client_write);
        assert_eq!(transport.receive().await.unwrap(), Some(json!({ "a": 1 })));
        assert_eq!(transport.receive().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stream_transport_rejects_garbage() {
        let (client, server) = tokio::io::duplex(1024);
        let (_server_read, mut server_write) = tokio::io::split(server);
        let (client_read, client_write) = tokio::io::split(client);

        server_write.write_all(b"not json\n{\"id\":1\n").await.unwrap();

        let mut transport = StreamTransport::new(client_read, client_write);
        let err = transport.receive().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let truncated = transport.receive().await.unwrap_err();
        assert_eq!(truncated.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_spawn_missing_command_fails() {
        let result = StdioTransport::spawn(
            "definitely-not-a-real-command-4821",
            &[],
            &HashMap::new(),
        );
        assert!(result.is_err());
    }
}
