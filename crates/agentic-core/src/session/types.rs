//! Types shared between the turn loop and its frontends

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Conversation;
use crate::config::{defaults, Settings};
use crate::orchestration::SystemPrompt;
use crate::provider::TokenUsage;

/// Everything the turn loop needs besides its collaborators
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Model calls allowed per query
    pub max_iterations: usize,
    pub termination_token: String,
    /// Offer the provider-side web search tool, with this use cap
    pub web_search: Option<u32>,
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: defaults::MODEL.to_string(),
            max_tokens: defaults::MAX_TOKENS,
            max_iterations: defaults::MAX_ITERATIONS,
            termination_token: defaults::TERMINATION_TOKEN.to_string(),
            web_search: None,
            system_prompt: SystemPrompt::new().build(),
        }
    }
}

impl AgentConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let agent = &settings.agent;
        let prompt = match &agent.system_prompt {
            Some(base) => SystemPrompt::with_base(base.clone()),
            None => SystemPrompt::new(),
        };

        Self {
            model: settings.provider.model.clone(),
            max_tokens: settings.provider.max_tokens,
            max_iterations: agent.max_iterations,
            termination_token: agent.termination_token.clone(),
            web_search: agent.web_search.then_some(agent.web_search_max_uses),
            system_prompt: prompt
                .with_termination_token(agent.termination_token.clone())
                .build(),
        }
    }
}

/// Turn loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingModel,
    DispatchingTools,
    Terminated,
}

/// How a query ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopOutcome {
    /// The model emitted the termination token
    Terminated,
    /// The iteration budget ran out first
    BudgetExhausted,
}

/// Result of one query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub outcome: LoopOutcome,
    pub conversation: Conversation,
    /// Model calls made
    pub turns: usize,
    /// Text of the terminating response, if any
    pub final_text: Option<String>,
    pub usage: TokenUsage,
}

impl QueryOutcome {
    pub fn is_terminated(&self) -> bool {
        self.outcome == LoopOutcome::Terminated
    }
}

/// Progress notifications, in the order things happen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// A model call is about to be made
    TurnStarted { turn: usize },
    /// Agent text, flushed before a tool call or at the end of a turn
    AgentText { text: String },
    ToolCall { id: String, name: String, arguments: Value },
    ToolResult {
        id: String,
        name: String,
        output: String,
        is_error: bool,
    },
    /// The provider ran one of its own tools
    RemoteToolUse { name: String, input: Value },
    RemoteToolResult { tool_use_id: String },
    /// A "continue" nudge was appended
    ContinueInjected,
    FinalAnswer { text: String },
    BudgetExhausted { turns: usize },
}
