//! agentic CLI
//!
//! Connects to the tool servers named in a JSON config, then runs queries
//! through the agent loop: one query from the command line, or an
//! interactive prompt when none is given.

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use agentic_core::{
    AgentConfig, AgentLoop, AnthropicClient, LoopOutcome, ModelClient, ServersConfig, Settings,
    ToolSessionPool,
};
use agentic_mcp::ClientInfo;
use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "agentic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tool-calling agent over MCP servers", long_about = None)]
struct Cli {
    /// Tool server configuration (JSON with an `mcpServers` map)
    config: PathBuf,

    /// Query to run; opens an interactive prompt when omitted
    query: Option<String>,

    /// Settings file (default: <config dir>/agentic/config.toml)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Max tokens per model response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Model calls allowed per query
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Offer the provider-side web search tool
    #[arg(long)]
    web_search: bool,

    /// API base URL (for proxies)
    #[arg(long)]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; credentials may come from the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "info,agentic_core=debug"
        } else {
            "warn"
        })
        .init();

    let mut pool = ToolSessionPool::default();
    if let Err(e) = run(&cli, &mut pool).await {
        eprintln!("{}", style(format!("An error occurred: {:#}", e)).red());
    }
    pool.shutdown().await;

    Ok(())
}

async fn run(cli: &Cli, pool: &mut ToolSessionPool) -> Result<()> {
    let mut settings = Settings::load(cli.settings.as_deref())?;
    apply_overrides(&mut settings, cli);

    let servers = ServersConfig::load(&cli.config)?;
    let Some(api_key) = settings.provider.get_api_key() else {
        bail!(
            "No API key found. Set {} (a .env file works) or add api_key under [provider] in the settings file",
            settings.provider.api_key_env
        );
    };

    println!(
        "{} {}",
        style("Connecting to tool servers:").bold(),
        servers.mcp_servers.keys().cloned().collect::<Vec<_>>().join(", ")
    );
    *pool = ToolSessionPool::connect(
        &servers.mcp_servers,
        &ClientInfo::new("agentic", env!("CARGO_PKG_VERSION")),
    )
    .await?;

    for session in pool.sessions() {
        println!(
            "  {} {}: {}",
            style("•").cyan(),
            style(session.name()).bold(),
            session
                .initial_tools()
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let model: Arc<dyn ModelClient> = Arc::new(AnthropicClient::with_base_url(
        api_key,
        settings.provider.base_url.as_deref(),
    )?);
    let config = AgentConfig::from_settings(&settings);
    info!(model = %config.model, max_iterations = config.max_iterations, "Agent configured");

    match &cli.query {
        Some(query) => run_query(&model, &config, pool, query).await,
        None => run_interactive(&model, &config, pool).await,
    }
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(model) = &cli.model {
        settings.provider.model = model.clone();
    }
    if let Some(max_tokens) = cli.max_tokens {
        settings.provider.max_tokens = max_tokens;
    }
    if let Some(base_url) = &cli.base_url {
        settings.provider.base_url = Some(base_url.clone());
    }
    if let Some(max_iterations) = cli.max_iterations {
        settings.agent.max_iterations = max_iterations;
    }
    if cli.web_search {
        settings.agent.web_search = true;
    }
}

async fn run_query(
    model: &Arc<dyn ModelClient>,
    config: &AgentConfig,
    pool: &ToolSessionPool,
    query: &str,
) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(render::print_events(rx));

    let agent = AgentLoop::new(model.clone(), config.clone()).with_events(tx);
    let result = agent.process_query(pool, query).await;
    // Dropping the loop closes the channel so the printer drains and exits
    drop(agent);
    printer.await.context("transcript printer panicked")?;

    let outcome = result?;
    debug!(turns = outcome.turns, messages = outcome.conversation.len(), "Query finished");
    if outcome.outcome == LoopOutcome::BudgetExhausted {
        println!(
            "{}",
            style(format!(
                "Hint: raise the limit with --max-iterations (currently {})",
                config.max_iterations
            ))
            .dim()
        );
    }
    println!(
        "{}",
        style(format!(
            "{} turns, {} input / {} output tokens",
            outcome.turns, outcome.usage.input_tokens, outcome.usage.output_tokens
        ))
        .dim()
    );

    Ok(())
}

async fn run_interactive(
    model: &Arc<dyn ModelClient>,
    config: &AgentConfig,
    pool: &ToolSessionPool,
) -> Result<()> {
    println!("{}", style("Type a task for the agent, or 'exit' to quit.").dim());

    loop {
        let line = tokio::task::spawn_blocking(|| {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt("You")
                .allow_empty(true)
                .interact_text()
        })
        .await?;

        // Ctrl-D or a closed terminal ends the session
        let Ok(line) = line else { break };
        let query = line.trim();
        match query {
            "" => continue,
            "exit" | "quit" => break,
            _ => {}
        }

        // One failed query should not end the session
        if let Err(e) = run_query(model, config, pool, query).await {
            eprintln!("{}", style(format!("Error: {:#}", e)).red());
        }
    }

    Ok(())
}
