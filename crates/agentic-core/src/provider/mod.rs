//! Model provider abstraction
//!
//! The turn loop talks to the model through [`ModelClient`]. Messages and
//! content blocks follow the Anthropic Messages API shape, which is also the
//! wire format of the one concrete client, [`AnthropicClient`].

mod anthropic;

pub use anthropic::{AnthropicClient, ANTHROPIC_API_URL, ANTHROPIC_VERSION};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::tools::ToolDescriptor;

/// Wire type of the provider-side web search tool
pub const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";

/// Conversation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One unit of model output or conversation content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Tool executed on the provider's side (e.g. web search)
    ServerToolUse {
        id: String,
        name: String,
        input: Value,
    },
    WebSearchToolResult {
        tool_use_id: String,
        content: Value,
    },
    /// Block types this client does not understand
    #[serde(other)]
    Unknown,
}

/// Message content: plain text or a list of blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A role-tagged conversation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Assistant message recording a tool call
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: id.into(),
                name: name.into(),
                input,
            }]),
        }
    }

    /// User message reporting a tool's output back to the model
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
                is_error,
            }]),
        }
    }

    /// Text content as a string (for logging/display)
    pub fn content_as_text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => text.clone(),
                    ContentBlock::ToolUse { name, input, .. }
                    | ContentBlock::ServerToolUse { name, input, .. } => format!("{}({})", name, input),
                    ContentBlock::ToolResult { content, .. } => content.clone(),
                    ContentBlock::WebSearchToolResult { .. } => "[web search results]".to_string(),
                    ContentBlock::Unknown => String::new(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Tool offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolSpec {
    /// Tool executed locally through a tool server
    Custom {
        name: String,
        description: String,
        input_schema: Value,
    },
    /// Tool executed by the provider
    Builtin {
        #[serde(rename = "type")]
        kind: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_uses: Option<u32>,
    },
}

impl ToolSpec {
    pub fn web_search(max_uses: Option<u32>) -> Self {
        ToolSpec::Builtin {
            kind: WEB_SEARCH_TOOL_TYPE.to_string(),
            name: "web_search".to_string(),
            max_uses,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ToolSpec::Custom { name, .. } | ToolSpec::Builtin { name, .. } => name,
        }
    }
}

impl From<&ToolDescriptor> for ToolSpec {
    fn from(tool: &ToolDescriptor) -> Self {
        ToolSpec::Custom {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.input_schema.clone(),
        }
    }
}

/// Request for one model call
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    PauseTurn,
    Refusal,
    #[serde(other)]
    Other,
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Response from one model call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: TokenUsage,
}

impl MessageResponse {
    /// True when the model stopped on `token` (given as a stop sequence)
    pub fn stopped_on(&self, token: &str) -> bool {
        self.stop_reason == Some(StopReason::StopSequence)
            && self.stop_sequence.as_deref() == Some(token)
    }

    /// True when the response carries no text and no tool calls of any kind
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|block| match block {
            ContentBlock::Text { text } => text.trim().is_empty(),
            ContentBlock::Unknown => true,
            _ => false,
        })
    }
}

/// The model API as seen by the turn loop
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Provider name (for logging)
    fn name(&self) -> &str;

    /// Run one model call
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse>;
}
