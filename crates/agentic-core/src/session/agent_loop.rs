//! Agent Loop - drives one query to completion
//!
//! The agent loop handles:
//! - Calling the model with the full transcript and tool catalog
//! - Dispatching requested tools, one at a time, in the order requested
//! - Detecting the termination token and enforcing the iteration budget
//! - Emitting progress events for display

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::types::{AgentConfig, LoopEvent, LoopOutcome, LoopState, QueryOutcome};
use super::Conversation;
use crate::error::Result;
use crate::mcp_manager::ToolSessionPool;
use crate::provider::{ContentBlock, Message, MessageRequest, ModelClient, TokenUsage, ToolSpec};
use crate::tools::ToolRegistry;

/// User message appended when a turn requested no tools
pub const CONTINUE_PROMPT: &str = "continue";

/// Tool result text used when a tool returns nothing
pub const NO_RETURN_VALUE: &str = "no return value";

/// What a single turn produced
#[derive(Default)]
struct TurnSummary {
    /// Text not yet flushed for display
    pending_text: Vec<String>,
    tool_calls: usize,
}

/// Runs queries against a model and a pool of tool providers
pub struct AgentLoop {
    model: Arc<dyn ModelClient>,
    config: AgentConfig,
    output_tx: Option<mpsc::UnboundedSender<LoopEvent>>,
}

impl AgentLoop {
    pub fn new(model: Arc<dyn ModelClient>, config: AgentConfig) -> Self {
        Self {
            model,
            config,
            output_tx: None,
        }
    }

    /// Send progress events to `tx`
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<LoopEvent>) -> Self {
        self.output_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Process one query until the model emits the termination token or the
    /// iteration budget runs out. Errors from the model or from tool
    /// dispatch (including unknown tool names) end the query.
    pub async fn process_query(&self, pool: &ToolSessionPool, query: &str) -> Result<QueryOutcome> {
        let registry = ToolRegistry::build(pool).await?;
        let tools = self.tool_specs(&registry);
        info!(
            model = %self.config.model,
            provider = self.model.name(),
            tools = tools.len(),
            "Starting query"
        );

        let mut conversation = Conversation::new(query);
        let mut usage = TokenUsage::default();
        let mut state = LoopState::AwaitingModel;
        let mut turns = 0;

        while turns < self.config.max_iterations {
            turns += 1;
            debug!(turn = turns, ?state, messages = conversation.len(), "Calling model");
            self.emit(LoopEvent::TurnStarted { turn: turns });

            let request = MessageRequest {
                model: self.config.model.clone(),
                max_tokens: self.config.max_tokens,
                system: Some(self.config.system_prompt.clone()),
                messages: conversation.messages().to_vec(),
                tools: tools.clone(),
                stop_sequences: vec![self.config.termination_token.clone()],
            };
            let response = self.model.create_message(&request).await?;
            usage.input_tokens += response.usage.input_tokens;
            usage.output_tokens += response.usage.output_tokens;

            state = LoopState::DispatchingTools;
            debug!(
                turn = turns,
                ?state,
                stop_reason = ?response.stop_reason,
                blocks = response.content.len(),
                "Model responded"
            );

            let mut turn = TurnSummary::default();
            for block in response.content.iter().cloned() {
                self.handle_block(block, &registry, &mut conversation, &mut turn).await?;
            }

            if response.stopped_on(&self.config.termination_token) {
                state = LoopState::Terminated;
                let final_text = turn.pending_text.join("\n");
                info!(turns, ?state, "Query complete");
                if !final_text.is_empty() {
                    self.emit(LoopEvent::FinalAnswer { text: final_text.clone() });
                }

                return Ok(QueryOutcome {
                    outcome: LoopOutcome::Terminated,
                    conversation,
                    turns,
                    final_text: (!final_text.is_empty()).then_some(final_text),
                    usage,
                });
            }

            self.flush_text(&mut turn);

            if turn.tool_calls == 0 {
                debug!(turn = turns, empty = response.is_empty(), "No tool calls, nudging model");
                conversation.push(Message::user(CONTINUE_PROMPT));
                self.emit(LoopEvent::ContinueInjected);
            }

            state = LoopState::AwaitingModel;
        }

        warn!(turns, "Iteration budget exhausted before termination token");
        self.emit(LoopEvent::BudgetExhausted { turns });

        Ok(QueryOutcome {
            outcome: LoopOutcome::BudgetExhausted,
            conversation,
            turns,
            final_text: None,
            usage,
        })
    }

    /// Local tools in registry order, then the remote web search tool
    fn tool_specs(&self, registry: &ToolRegistry) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = registry.descriptors().into_iter().map(ToolSpec::from).collect();
        if let Some(max_uses) = self.config.web_search {
            specs.push(ToolSpec::web_search(Some(max_uses)));
        }
        specs
    }

    async fn handle_block(
        &self,
        block: ContentBlock,
        registry: &ToolRegistry,
        conversation: &mut Conversation,
        turn: &mut TurnSummary,
    ) -> Result<()> {
        match block {
            ContentBlock::Text { text } => {
                // The API rejects empty text blocks
                if text.trim().is_empty() {
                    return Ok(());
                }
                conversation.push(Message::assistant(text.clone()));
                turn.pending_text.push(text);
            }
            ContentBlock::ToolUse { id, name, input } => {
                self.flush_text(turn);
                turn.tool_calls += 1;

                conversation.push(Message::tool_use(id.clone(), name.clone(), input.clone()));
                self.emit(LoopEvent::ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    arguments: input.clone(),
                });

                let result = registry.dispatch(&name, input).await?;
                let mut output = result.joined_text();
                if output.trim().is_empty() {
                    output = NO_RETURN_VALUE.to_string();
                }
                debug!(tool = %name, is_error = result.is_error, bytes = output.len(), "Tool returned");

                conversation.push(Message::tool_result(id.clone(), output.clone(), result.is_error));
                self.emit(LoopEvent::ToolResult {
                    id,
                    name,
                    output,
                    is_error: result.is_error,
                });
            }
            ContentBlock::ServerToolUse { name, input, .. } => {
                self.flush_text(turn);
                conversation.push(Message::assistant(format!("Using remote tool {} with input {}", name, input)));
                self.emit(LoopEvent::RemoteToolUse { name, input });
            }
            ContentBlock::WebSearchToolResult { tool_use_id, .. } => {
                self.flush_text(turn);
                conversation.push(Message::assistant(format!("Received remote tool result for {}", tool_use_id)));
                self.emit(LoopEvent::RemoteToolResult { tool_use_id });
            }
            other => {
                debug!(block = ?other, "Ignoring unsupported content block");
            }
        }
        Ok(())
    }

    fn flush_text(&self, turn: &mut TurnSummary) {
        if turn.pending_text.is_empty() {
            return;
        }
        let text = turn.pending_text.drain(..).collect::<Vec<_>>().join("\n");
        self.emit(LoopEvent::AgentText { text });
    }

    fn emit(&self, event: LoopEvent) {
        if let Some(tx) = &self.output_tx {
            // A closed receiver only means nobody is watching
            let _ = tx.send(event);
        }
    }
}
