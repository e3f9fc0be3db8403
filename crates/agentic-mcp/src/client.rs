//! MCP Client implementation

use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::protocol::{
    methods, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
use crate::transport::Transport;
use crate::{McpTool, ServerCapabilities, PROTOCOL_VERSION};

/// MCP Client for connecting to MCP servers
pub struct McpClient<T: Transport> {
    transport: Mutex<T>,
    request_id: AtomicI64,
    server_capabilities: Option<ServerCapabilities>,
}

impl<T: Transport> McpClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
            request_id: AtomicI64::new(1),
            server_capabilities: None,
        }
    }

    fn next_id(&self) -> RequestId {
        RequestId::Number(self.request_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Capabilities reported by the server during `initialize`
    pub fn server_capabilities(&self) -> Option<&ServerCapabilities> {
        self.server_capabilities.as_ref()
    }

    /// Initialize the connection
    pub async fn initialize(&mut self, client_info: ClientInfo) -> Result<ServerInfo, McpError> {
        let params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": client_info.name,
                "version": client_info.version
            }
        });

        let request = JsonRpcRequest::new(self.next_id(), methods::INITIALIZE)
            .with_params(params);

        let result = self.send_request(request).await?;
        let server_info: InitializeResult = serde_json::from_value(result)
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        if server_info.protocol_version != PROTOCOL_VERSION {
            debug!(
                server = %server_info.protocol_version,
                client = PROTOCOL_VERSION,
                "Server negotiated a different protocol version"
            );
        }

        self.server_capabilities = Some(server_info.capabilities);

        self.send_notification(JsonRpcNotification::new(methods::INITIALIZED))
            .await?;

        Ok(ServerInfo {
            name: server_info.server_info.name,
            version: server_info.server_info.version,
        })
    }

    /// List available tools
    pub async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        let request = JsonRpcRequest::new(self.next_id(), methods::TOOLS_LIST)
            .with_params(serde_json::json!({}));
        let result = self.send_request(request).await?;

        let tools_result: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(tools_result.tools)
    }

    /// Call a tool
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolCallResult, McpError> {
        let params = serde_json::json!({
            "name": name,
            "arguments": arguments
        });

        let request = JsonRpcRequest::new(self.next_id(), methods::TOOLS_CALL)
            .with_params(params);

        let result = self.send_request(request).await?;
        serde_json::from_value(result).map_err(|e| McpError::Protocol(e.to_string()))
    }

    /// Close the underlying transport
    pub async fn close(&self) -> Result<(), McpError> {
        let mut transport = self.transport.lock().await;
        transport
            .close()
            .await
            .map_err(|e| McpError::Transport(e.to_string()))
    }

    async fn send_notification(&self, notification: JsonRpcNotification) -> Result<(), McpError> {
        let value = serde_json::to_value(&notification)
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        let mut transport = self.transport.lock().await;
        transport
            .send(value)
            .await
            .map_err(|e| McpError::Transport(e.to_string()))
    }

    /// Send a request and wait for the response carrying the same id.
    /// Notifications and unrelated traffic arriving in between are skipped.
    async fn send_request(&self, request: JsonRpcRequest) -> Result<serde_json::Value, McpError> {
        let mut transport = self.transport.lock().await;
        let id = request.id.clone();
        let method = request.method.clone();

        let request_value = serde_json::to_value(&request)
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        transport.send(request_value).await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        loop {
            let message = transport.receive().await
                .map_err(|e| McpError::Transport(e.to_string()))?
                .ok_or_else(|| McpError::Transport("Connection closed".to_string()))?;

            match IncomingMessage::classify(message)
                .map_err(|e| McpError::Protocol(e.to_string()))?
            {
                IncomingMessage::Response(response) if response.id == id => {
                    return into_result(response);
                }
                IncomingMessage::Response(response) => {
                    debug!(expected = %id, got = %response.id, "Ignoring response for another request");
                }
                IncomingMessage::Notification(notification) => {
                    trace!(method = %notification.method, "Skipping server notification");
                }
                IncomingMessage::Request(server_request) => {
                    // Server-initiated requests: answer pings, refuse the rest
                    let reply = if server_request.method == methods::PING {
                        JsonRpcResponse::success(server_request.id, serde_json::json!({}))
                    } else {
                        JsonRpcResponse::error(server_request.id, JsonRpcError::method_not_found())
                    };
                    let reply = serde_json::to_value(&reply)
                        .map_err(|e| McpError::Protocol(e.to_string()))?;
                    transport.send(reply).await
                        .map_err(|e| McpError::Transport(e.to_string()))?;
                }
            }
            trace!(%method, "Still waiting for response");
        }
    }
}

fn into_result(response: JsonRpcResponse) -> Result<serde_json::Value, McpError> {
    match (response.result, response.error) {
        (_, Some(error)) => Err(McpError::Server(format!("{} (code {})", error.message, error.code))),
        (Some(result), None) => Ok(result),
        (None, None) => Err(McpError::Protocol("Empty response".to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

impl ClientInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, serde::Deserialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
    #[serde(default)]
    capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfoInner,
}

#[derive(Debug, serde::Deserialize)]
struct ServerInfoInner {
    name: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, serde::Deserialize)]
struct ToolsListResult {
    tools: Vec<McpTool>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Plain-text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            is_error: false,
        }
    }

    /// Error result carrying a message for the model
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(message)],
            is_error: true,
        }
    }

    /// All text items joined by newlines; non-text items are summarized
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|item| match item.text.as_deref() {
                Some(text) => text.to_string(),
                None => format!("[{} content]", item.content_type),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// MCP errors
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Server error: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_joined_text_mixes_items() {
        let result: ToolCallResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "line one" },
                { "type": "image", "data": "..." },
                { "type": "text", "text": "line two" }
            ]
        }))
        .unwrap();

        assert!(!result.is_error);
        assert_eq!(result.joined_text(), "line one\n[image content]\nline two");
    }

    #[test]
    fn test_into_result_prefers_error() {
        let response = JsonRpcResponse::error(RequestId::Number(1), JsonRpcError::method_not_found());
        let err = into_result(response).unwrap_err();
        assert!(matches!(err, McpError::Server(msg) if msg.contains("-32601")));
    }
}
