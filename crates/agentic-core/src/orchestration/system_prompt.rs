//! System prompt management

use crate::config::defaults;

/// System prompt configuration and generation
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    /// Base system prompt
    base: String,
    /// Literal the model must emit when finished
    termination_token: String,
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPrompt {
    /// Create a new system prompt with the default content
    pub fn new() -> Self {
        Self {
            base: DEFAULT_SYSTEM_PROMPT.to_string(),
            termination_token: defaults::TERMINATION_TOKEN.to_string(),
        }
    }

    /// Create with custom base prompt
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Self::new()
        }
    }

    pub fn with_termination_token(mut self, token: impl Into<String>) -> Self {
        self.termination_token = token.into();
        self
    }

    /// Build the final system prompt. The completion instruction is always
    /// appended, even to a custom base, since the loop only ends on the token.
    pub fn build(&self) -> String {
        let mut prompt = self.base.trim_end().to_string();
        prompt.push_str("\n\n");
        prompt.push_str(&COMPLETION_INSTRUCTION.replace("{token}", &self.termination_token));
        prompt
    }
}

/// Default system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an autonomous agent. You complete the user's task by calling the tools available to you and inspecting their results.

## Working with Tools
- When several tool calls do not depend on each other, request them together in a single response instead of one per turn.
- Read every tool result before deciding on the next step. If a call fails, adjust and try again rather than repeating it unchanged.
- Prefer acting over asking: the user is not available to answer questions while you work."#;

const COMPLETION_INSTRUCTION: &str = r#"## Finishing
When the task is fully done, reply with a short summary of what you did, then output {token} on its own line. Never output {token} before the work is complete."#;
