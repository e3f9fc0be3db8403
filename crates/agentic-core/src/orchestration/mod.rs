//! Orchestration helpers shared by the turn loop and its frontends

mod system_prompt;

pub use system_prompt::{SystemPrompt, DEFAULT_SYSTEM_PROMPT};
