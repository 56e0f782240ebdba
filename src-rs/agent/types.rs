use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::config::PermissionMode;

/// One event streamed by the coding agent, decoded into a closed set of
/// kinds. Anything outside that set is kept verbatim in `Unknown`.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentEvent {
    System { data: Map<String, Value> },
    User { content: MessageContent },
    Assistant { content: Vec<ContentBlock> },
    Result(ResultSummary),
    Unknown(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    Text { text: String },
    ToolUse { name: String, input: Value },
    ToolResult { content: Value, is_error: bool },
    Other(Value),
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ResultSummary {
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub num_turns: Option<u32>,
    #[serde(default)]
    pub is_error: bool,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    System {
        #[serde(flatten)]
        data: Map<String, Value>,
    },
    User {
        message: WireMessage,
    },
    Assistant {
        message: WireMessage,
    },
    Result(ResultSummary),
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Value,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: Option<bool>,
    },
}

impl AgentEvent {
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<WireEvent>(value.clone()) {
            Ok(WireEvent::System { data }) => AgentEvent::System { data },
            Ok(WireEvent::User { message }) => AgentEvent::User {
                content: MessageContent::from_value(message.content),
            },
            Ok(WireEvent::Assistant { message }) => AgentEvent::Assistant {
                content: blocks_from_value(message.content),
            },
            Ok(WireEvent::Result(summary)) => AgentEvent::Result(summary),
            Err(_) => AgentEvent::Unknown(value),
        }
    }
}

impl MessageContent {
    fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => MessageContent::Text(text),
            Value::Array(_) => MessageContent::Blocks(blocks_from_value(value)),
            other => MessageContent::Text(other.to_string()),
        }
    }
}

impl ContentBlock {
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<WireBlock>(value.clone()) {
            Ok(WireBlock::Text { text }) => ContentBlock::Text { text },
            Ok(WireBlock::ToolUse { name, input }) => ContentBlock::ToolUse { name, input },
            Ok(WireBlock::ToolResult { content, is_error }) => ContentBlock::ToolResult {
                content,
                is_error: is_error.unwrap_or(false),
            },
            Err(_) => ContentBlock::Other(value),
        }
    }
}

fn blocks_from_value(value: Value) -> Vec<ContentBlock> {
    match value {
        Value::Array(items) => items.into_iter().map(ContentBlock::from_value).collect(),
        Value::Null => Vec::new(),
        other => vec![ContentBlock::Other(other)],
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    SystemMessage,
    ResultMessage,
    UserMessage,
    AssistantMessage,
    ErrorMessage,
    UnknownMessage,
}

/// The uniform `{type, content}` record persisted as a task's output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub content: String,
}

#[derive(Clone, Debug)]
pub struct AgentRequest {
    pub prompt: String,
    pub working_dir: PathBuf,
    pub permission_mode: PermissionMode,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The agent produced output that could not be decoded. Recoverable.
    #[error("malformed agent response: {0}")]
    MalformedResponse(String),

    #[error("failed to start agent: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to read agent output: {0}")]
    Io(#[source] std::io::Error),

    #[error("agent exited with {}: {stderr}", exit_label(.code))]
    Exited { code: Option<i32>, stderr: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "signal".to_string(),
    }
}

/// Finite, non-restartable stream of decoded agent events.
pub type EventReceiver = mpsc::Receiver<Result<AgentEvent, TransportError>>;

#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn open(&self, request: AgentRequest) -> Result<EventReceiver, TransportError>;
}
