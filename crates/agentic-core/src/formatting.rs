//! Display formatting for tool calls and results

use serde_json::Value;

/// Truncate to at most `max` bytes, ending on a char boundary, with "..."
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max.saturating_sub(3);
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// One-line rendering of a tool call, e.g. `bash(command: "ls -la")`
pub fn format_tool_call(tool_name: &str, args: &Value) -> String {
    match args {
        Value::Object(map) if map.is_empty() => format!("{}()", tool_name),
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(key, value)| {
                    let rendered = match value {
                        Value::String(s) => format!("{:?}", truncate_str(s, 60)),
                        other => truncate_str(&other.to_string(), 60),
                    };
                    format!("{}: {}", key, rendered)
                })
                .collect();
            format!("{}({})", tool_name, parts.join(", "))
        }
        Value::Null => format!("{}()", tool_name),
        other => format!("{}({})", tool_name, truncate_str(&other.to_string(), 60)),
    }
}

/// Tool output trimmed for the terminal: at most `max_lines` lines
pub fn format_tool_result(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    if lines.len() <= max_lines {
        return output.trim_end().to_string();
    }
    format!(
        "{}\n... ({} more lines)",
        lines[..max_lines].join("\n"),
        lines.len() - max_lines
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("abcdefghij", 8), "abcde...");
        assert_eq!(truncate_str("ééééé", 6), "é...");
    }

    #[test]
    fn test_format_tool_call() {
        assert_eq!(format_tool_call("bash", &json!({ "command": "ls" })), "bash(command: \"ls\")");
        assert_eq!(format_tool_call("ping", &json!({})), "ping()");
        assert_eq!(format_tool_call("add", &json!({ "a": 1, "b": 2 })), "add(a: 1, b: 2)");
    }

    #[test]
    fn test_format_tool_result_limits_lines() {
        assert_eq!(format_tool_result("one\ntwo\n", 5), "one\ntwo");
        assert_eq!(format_tool_result("1\n2\n3\n4", 2), "1\n2\n... (2 more lines)");
    }
}
