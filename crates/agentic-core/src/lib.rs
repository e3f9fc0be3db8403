//! Agentic Core - tool-calling agent loop over MCP tool servers
//!
//! This crate provides:
//! - Configuration for tool servers and agent settings
//! - A pool of connected tool-provider sessions and a routing registry
//! - The model client abstraction with an Anthropic Messages API client
//! - The turn loop that drives a query until the model signals completion

pub mod config;
pub mod error;
pub mod formatting;
pub mod mcp_manager;
pub mod orchestration;
pub mod provider;
pub mod session;
pub mod tools;

pub use config::{defaults, AgentSettings, McpServerConfig, ProviderConfig, ServersConfig, Settings};
pub use error::{Error, Result, ToolError};
pub use mcp_manager::{ProviderSession, ToolProvider, ToolSessionPool};
pub use provider::{
    AnthropicClient, ContentBlock, Message, MessageContent, MessageRequest, MessageResponse,
    ModelClient, Role, StopReason, TokenUsage, ToolSpec,
};
pub use tools::{ToolCollision, ToolDescriptor, ToolRegistry};

// Orchestration exports
pub use orchestration::SystemPrompt;

// Session exports
pub use session::{
    AgentConfig, AgentLoop, Conversation, LoopEvent, LoopOutcome, LoopState, QueryOutcome,
};

// Formatting exports
pub use formatting::{format_tool_call, format_tool_result, truncate_str};
