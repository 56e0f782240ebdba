use serde_json::Value;

use super::types::{AgentEvent, ContentBlock, EventKind, MessageContent, NormalizedEvent, ResultSummary};

const TOOL_RESULT_LIMIT: usize = 500;
const TOOL_INPUT_LIMIT: usize = 200;

pub fn normalize(event: &AgentEvent) -> NormalizedEvent {
    let (kind, content) = match event {
        AgentEvent::System { data } => (EventKind::SystemMessage, Value::Object(data.clone()).to_string()),
        AgentEvent::Result(summary) => (EventKind::ResultMessage, render_result(summary)),
        AgentEvent::User { content } => (EventKind::UserMessage, render_user(content)),
        AgentEvent::Assistant { content } => (EventKind::AssistantMessage, render_blocks(content)),
        AgentEvent::Unknown(value) => (EventKind::UnknownMessage, value.to_string()),
    };
    NormalizedEvent { kind, content }
}

/// Synthetic event recorded in place of a stream that broke mid-way.
pub fn transport_fault_event(detail: &str) -> NormalizedEvent {
    NormalizedEvent {
        kind: EventKind::ErrorMessage,
        content: format!(
            "Claude SDK communication error: {}\n\nThis appears to be a temporary issue with the Claude Code SDK. You can try running the task again.",
            detail
        ),
    }
}

fn render_result(summary: &ResultSummary) -> String {
    let mut parts = Vec::new();
    if let Some(cost) = summary.total_cost_usd.filter(|cost| *cost != 0.0) {
        parts.push(format!("Cost: ${:.4}", cost));
    }
    if let Some(duration) = summary.duration_ms.filter(|ms| *ms != 0) {
        parts.push(format!("Duration: {}ms", duration));
    }
    if let Some(turns) = summary.num_turns.filter(|turns| *turns != 0) {
        parts.push(format!("Turns: {}", turns));
    }
    parts.push(if summary.is_error { "Status: Error" } else { "Status: Success" }.to_string());
    parts.join(" | ")
}

fn render_user(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Blocks(blocks) => render_blocks(blocks),
    }
}

fn render_blocks(blocks: &[ContentBlock]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            ContentBlock::Text { text } => lines.push(text.clone()),
            ContentBlock::ToolUse { name, input } => {
                lines.push(format!("Using tool: {}", name));
                let file_path = input.get("file_path").and_then(|v| v.as_str());
                match (name.as_str(), file_path) {
                    ("Write", Some(path)) => lines.push(format!("Writing file: {}", path)),
                    _ => {
                        let rendered = input.to_string();
                        if !input.is_null() && rendered.chars().count() < TOOL_INPUT_LIMIT {
                            lines.push(format!("Input: {}", rendered));
                        }
                    }
                }
            }
            ContentBlock::ToolResult { content, is_error } => {
                let text = truncate(&value_text(content), TOOL_RESULT_LIMIT);
                if *is_error {
                    lines.push(format!("Tool Error: {}", text));
                } else {
                    lines.push(format!("Tool Result: {}", text));
                }
            }
            ContentBlock::Other(value) => lines.push(value.to_string()),
        }
    }
    lines.join("\n")
}

// Tool results arrive either as a plain string or as a list of text blocks.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.get("text").and_then(|t| t.as_str()) {
                Some(text) => text.to_string(),
                None => item.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}... (truncated)", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_summary_lists_only_present_figures() {
        let event = AgentEvent::Result(ResultSummary {
            total_cost_usd: Some(0.01234),
            duration_ms: Some(5400),
            num_turns: Some(0),
            is_error: false,
        });
        let normalized = normalize(&event);
        assert_eq!(normalized.kind, EventKind::ResultMessage);
        assert_eq!(normalized.content, "Cost: $0.0123 | Duration: 5400ms | Status: Success");

        let failed = normalize(&AgentEvent::Result(ResultSummary {
            is_error: true,
            ..ResultSummary::default()
        }));
        assert_eq!(failed.content, "Status: Error");
    }

    #[test]
    fn assistant_blocks_render_one_line_group_each() {
        let event = AgentEvent::Assistant {
            content: vec![
                ContentBlock::Text { text: "Creating the file".into() },
                ContentBlock::ToolUse {
                    name: "Write".into(),
                    input: json!({"file_path": "src/main.rs", "content": "fn main() {}"}),
                },
                ContentBlock::ToolUse { name: "Bash".into(), input: json!({"command": "ls"}) },
                ContentBlock::ToolResult { content: json!("done"), is_error: false },
                ContentBlock::ToolResult { content: json!("boom"), is_error: true },
            ],
        };
        let normalized = normalize(&event);
        assert_eq!(normalized.kind, EventKind::AssistantMessage);
        assert_eq!(
            normalized.content,
            "Creating the file\nUsing tool: Write\nWriting file: src/main.rs\nUsing tool: Bash\nInput: {\"command\":\"ls\"}\nTool Result: done\nTool Error: boom"
        );
    }

    #[test]
    fn long_tool_input_is_omitted() {
        let event = AgentEvent::Assistant {
            content: vec![ContentBlock::ToolUse {
                name: "Edit".into(),
                input: json!({"old": "x".repeat(300)}),
            }],
        };
        assert_eq!(normalize(&event).content, "Using tool: Edit");
    }

    #[test]
    fn tool_results_are_truncated_after_limit() {
        let long = "é".repeat(600);
        let event = AgentEvent::User {
            content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                content: json!(long),
                is_error: false,
            }]),
        };
        let content = normalize(&event).content;
        assert!(content.ends_with("... (truncated)"));
        assert_eq!(
            content.trim_start_matches("Tool Result: ").trim_end_matches("... (truncated)").chars().count(),
            500
        );
    }

    #[test]
    fn user_text_and_unknown_events_fall_through() {
        let user = normalize(&AgentEvent::User { content: MessageContent::Text("add tests".into()) });
        assert_eq!(user.kind, EventKind::UserMessage);
        assert_eq!(user.content, "add tests");

        let unknown = normalize(&AgentEvent::Unknown(json!({"type": "ping"})));
        assert_eq!(unknown.kind, EventKind::UnknownMessage);
        assert_eq!(unknown.content, "{\"type\":\"ping\"}");
    }

    #[test]
    fn fault_event_advises_retry() {
        let event = transport_fault_event("unexpected token");
        assert_eq!(event.kind, EventKind::ErrorMessage);
        assert!(event.content.starts_with("Claude SDK communication error: unexpected token"));
        assert!(event.content.contains("try running the task again"));
    }
}
