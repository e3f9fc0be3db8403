//! MCP Server implementation

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::client::ToolCallResult;
use crate::protocol::{methods, IncomingMessage, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::transport::Transport;
use crate::{McpTool, ServerCapabilities, ToolsCapability, PROTOCOL_VERSION};

/// Handler for MCP requests
#[async_trait]
pub trait McpHandler: Send + Sync {
    /// List available tools
    async fn list_tools(&self) -> Vec<McpTool>;

    /// Call a tool. `Err` is reported to the client as an `isError` result.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolCallResult, String>;
}

/// MCP Server
pub struct McpServer<H: McpHandler> {
    handler: Arc<H>,
    capabilities: ServerCapabilities,
    server_name: String,
    server_version: String,
}

impl<H: McpHandler> McpServer<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_name: "agentic-mcp".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = version.into();
        self
    }

    /// Serve requests from `transport` until the peer closes it.
    pub async fn serve<T: Transport>(&self, transport: &mut T) -> io::Result<()> {
        info!(server = %self.server_name, "MCP server listening");

        loop {
            let value = match transport.receive().await {
                Ok(Some(value)) => value,
                Ok(None) => break,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!(error = %e, "Discarding malformed message");
                    let reply = JsonRpcResponse::error(RequestId::Null, JsonRpcError::parse_error());
                    transport.send(serde_json::to_value(&reply)?).await?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let message = match IncomingMessage::classify(value) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "Discarding invalid JSON-RPC message");
                    let reply = JsonRpcResponse::error(RequestId::Null, JsonRpcError::invalid_request());
                    transport.send(serde_json::to_value(&reply)?).await?;
                    continue;
                }
            };

            match message {
                IncomingMessage::Request(request) => {
                    let response = self.handle_request(request).await;
                    transport.send(serde_json::to_value(&response)?).await?;
                }
                IncomingMessage::Notification(notification) => {
                    debug!(method = %notification.method, "Received notification");
                }
                IncomingMessage::Response(response) => {
                    debug!(id = %response.id, "Ignoring unsolicited response");
                }
            }
        }

        info!(server = %self.server_name, "Client disconnected");
        Ok(())
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request.id),
            methods::PING => JsonRpcResponse::success(request.id, serde_json::json!({})),
            methods::TOOLS_LIST => self.handle_tools_list(request.id).await,
            methods::TOOLS_CALL => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(request.id, JsonRpcError::method_not_found()),
        }
    }

    fn handle_initialize(&self, id: RequestId) -> JsonRpcResponse {
        let result = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": self.capabilities,
            "serverInfo": {
                "name": self.server_name,
                "version": self.server_version
            }
        });

        JsonRpcResponse::success(id, result)
    }

    async fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let tools = self.handler.list_tools().await;
        JsonRpcResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let params = match params {
            Some(p) => p,
            None => return JsonRpcResponse::error(id, JsonRpcError::invalid_params()),
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n,
            None => return JsonRpcResponse::error(id, JsonRpcError::invalid_params()),
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = match self.handler.call_tool(name, arguments).await {
            Ok(result) => result,
            Err(e) => ToolCallResult::error(e),
        };

        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::new(-32603, e.to_string())),
        }
    }
}
