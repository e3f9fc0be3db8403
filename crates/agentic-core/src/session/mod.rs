//! Query sessions
//!
//! A session is one user query driven to completion by the [`AgentLoop`].
//! Its transcript is a [`Conversation`] that only ever grows.

mod agent_loop;
mod types;

pub use agent_loop::{AgentLoop, CONTINUE_PROMPT, NO_RETURN_VALUE};
pub use types::{AgentConfig, LoopEvent, LoopOutcome, LoopState, QueryOutcome};

use crate::provider::{Message, Role};

/// Append-only transcript exchanged with the model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with the user's query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(query)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_role(&self) -> Option<Role> {
        self.messages.last().map(|m| m.role)
    }
}
