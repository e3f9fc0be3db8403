//! Console transcript rendering

use agentic_core::{format_tool_call, format_tool_result, LoopEvent};
use console::style;
use tokio::sync::mpsc;

/// Lines of tool output shown before eliding the rest
const MAX_RESULT_LINES: usize = 20;

/// Print events until the loop drops its sender
pub async fn print_events(mut rx: mpsc::UnboundedReceiver<LoopEvent>) {
    while let Some(event) = rx.recv().await {
        println!("{}", render_event(&event));
    }
}

pub fn render_event(event: &LoopEvent) -> String {
    match event {
        LoopEvent::TurnStarted { turn } => style(format!("── turn {} ──", turn)).dim().to_string(),
        LoopEvent::AgentText { text } => format!("{}: {}", style("Agent thinking").bold().cyan(), text),
        LoopEvent::ToolCall { name, arguments, .. } => format!(
            "  {} {}",
            style("[Calling tool]").dim(),
            style(format_tool_call(name, arguments)).yellow()
        ),
        LoopEvent::ToolResult { name, output, is_error, .. } => {
            let marker = if *is_error {
                style("✗").red()
            } else {
                style("✓").green()
            };
            let body = format_tool_result(output, MAX_RESULT_LINES)
                .lines()
                .map(|line| format!("    {}", line))
                .collect::<Vec<_>>()
                .join("\n");
            format!("  {} {}\n{}", marker, style(name).dim(), style(body).dim())
        }
        LoopEvent::RemoteToolUse { name, input } => format!(
            "  {} {}",
            style("[Remote tool]").dim(),
            style(format_tool_call(name, input)).magenta()
        ),
        LoopEvent::RemoteToolResult { tool_use_id } => {
            style(format!("  [Remote tool result {}]", tool_use_id)).dim().to_string()
        }
        LoopEvent::ContinueInjected => style("  (no tool calls, asking the agent to continue)").dim().to_string(),
        LoopEvent::FinalAnswer { text } => {
            format!("{}: {}", style("Agent final answer").bold().green(), text)
        }
        LoopEvent::BudgetExhausted { turns } => style(format!(
            "Stopped after {} turns without the agent finishing",
            turns
        ))
        .yellow()
        .to_string(),
    }
}
