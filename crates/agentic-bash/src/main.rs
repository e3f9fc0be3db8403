//! agentic-bash - MCP server exposing a `bash` tool over stdio

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agentic_bash::{BashConfig, BashTool, DEFAULT_TIMEOUT_SECS};
use agentic_mcp::{McpServer, StreamTransport};
use anyhow::Result;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "agentic-bash")]
#[command(author, version, about = "MCP server with a single bash tool", long_about = None)]
struct Cli {
    /// Per-command timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Shell used to run commands
    #[arg(long, default_value = "bash")]
    shell: String,

    /// Working directory for commands
    #[arg(short = 'C', long)]
    working_dir: Option<PathBuf>,

    /// Enable verbose logging (to stderr)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose { "info,agentic_bash=debug" } else { "warn" })
        .with_writer(std::io::stderr)
        .init();

    let tool = BashTool::new(BashConfig {
        shell: cli.shell,
        timeout: Duration::from_secs(cli.timeout),
        working_dir: cli.working_dir,
    });

    let server = McpServer::new(Arc::new(tool))
        .with_name("bash")
        .with_version(env!("CARGO_PKG_VERSION"));

    info!("Serving bash tool on stdio");
    let mut transport = StreamTransport::stdio();
    server.serve(&mut transport).await?;
    info!("Client disconnected");

    Ok(())
}
