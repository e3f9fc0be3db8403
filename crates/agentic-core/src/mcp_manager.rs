//! Tool session pool
//!
//! Owns the connections to tool-provider subprocesses: spawning them,
//! running the MCP handshake, and releasing them on shutdown.

use std::collections::BTreeMap;
use std::sync::Arc;

use agentic_mcp::{ClientInfo, McpClient, StdioTransport, ToolCallResult, Transport};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::McpServerConfig;
use crate::error::{Error, Result, ToolError};
use crate::tools::ToolDescriptor;

/// A connected source of tools
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Current tool catalog; asked again for every query
    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolError>;

    /// Invoke one tool
    async fn call_tool(&self, name: &str, arguments: Value) -> std::result::Result<ToolCallResult, ToolError>;

    /// Release the connection
    async fn shutdown(&self) -> std::result::Result<(), ToolError>;
}

#[async_trait]
impl<T: Transport + 'static> ToolProvider for McpClient<T> {
    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolError> {
        let tools = McpClient::list_tools(self).await?;
        Ok(tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> std::result::Result<ToolCallResult, ToolError> {
        Ok(McpClient::call_tool(self, name, arguments).await?)
    }

    async fn shutdown(&self) -> std::result::Result<(), ToolError> {
        Ok(self.close().await?)
    }
}

/// One connected tool provider
pub struct ProviderSession {
    name: String,
    provider: Box<dyn ToolProvider>,
    initial_tools: Vec<ToolDescriptor>,
}

impl ProviderSession {
    pub fn new(name: impl Into<String>, provider: Box<dyn ToolProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
            initial_tools: Vec::new(),
        }
    }

    /// Record the catalog the server reported while connecting
    pub fn with_initial_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.initial_tools = tools;
        self
    }

    /// Configured server name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Catalog seen at connect time. Queries list tools afresh instead.
    pub fn initial_tools(&self) -> &[ToolDescriptor] {
        &self.initial_tools
    }

    pub async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolError> {
        self.provider.list_tools().await
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> std::result::Result<ToolCallResult, ToolError> {
        self.provider.call_tool(name, arguments).await
    }
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession").field("name", &self.name).finish()
    }
}

/// Pool of connected tool providers
#[derive(Debug, Default)]
pub struct ToolSessionPool {
    sessions: Vec<Arc<ProviderSession>>,
}

impl ToolSessionPool {
    /// Connect to every configured server, in name order. Any failure shuts
    /// down the servers already connected and fails the whole call.
    pub async fn connect(
        configs: &BTreeMap<String, McpServerConfig>,
        client_info: &ClientInfo,
    ) -> Result<Self> {
        let mut pool = Self::default();

        for (name, config) in configs {
            match connect_server(name, config, client_info).await {
                Ok(session) => pool.sessions.push(Arc::new(session)),
                Err(e) => {
                    pool.shutdown().await;
                    return Err(e);
                }
            }
        }

        info!(servers = pool.sessions.len(), "Tool session pool ready");
        Ok(pool)
    }

    /// Build a pool from providers that are already connected
    pub fn from_providers(providers: Vec<(String, Box<dyn ToolProvider>)>) -> Self {
        Self {
            sessions: providers
                .into_iter()
                .map(|(name, provider)| Arc::new(ProviderSession::new(name, provider)))
                .collect(),
        }
    }

    /// Connected sessions, in connection order
    pub fn sessions(&self) -> &[Arc<ProviderSession>] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Release every connection. Safe to call more than once; later calls
    /// find nothing left to release.
    pub async fn shutdown(&mut self) {
        for session in self.sessions.drain(..) {
            match session.provider.shutdown().await {
                Ok(()) => debug!(server = %session.name, "Tool server shut down"),
                Err(e) => warn!(server = %session.name, error = %e, "Failed to shut down tool server"),
            }
        }
    }
}

async fn connect_server(
    name: &str,
    config: &McpServerConfig,
    client_info: &ClientInfo,
) -> Result<ProviderSession> {
    let connection_error = |message: String| Error::Connection {
        server: name.to_string(),
        message,
    };

    debug!(server = name, command = %config.command, args = ?config.args, "Starting tool server");

    let transport = StdioTransport::spawn(&config.command, &config.args, &config.env)
        .map_err(|e| connection_error(format!("failed to launch '{}': {}", config.command, e)))?;

    let mut client = McpClient::new(transport);
    let server_info = match client.initialize(client_info.clone()).await {
        Ok(info) => info,
        Err(e) => {
            let _ = client.close().await;
            return Err(connection_error(format!("handshake failed: {}", e)));
        }
    };

    let tools = match McpClient::list_tools(&client).await {
        Ok(tools) => tools,
        Err(e) => {
            let _ = client.close().await;
            return Err(connection_error(format!("tool listing failed: {}", e)));
        }
    };

    info!(
        server = name,
        remote_name = %server_info.name,
        remote_version = %server_info.version,
        tools = ?tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        "Connected to tool server"
    );

    let tools = tools.into_iter().map(ToolDescriptor::from).collect();
    Ok(ProviderSession::new(name, Box::new(client)).with_initial_tools(tools))
}
