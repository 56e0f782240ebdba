pub mod claude_adapter;
pub mod executor;
pub mod normalize;
pub mod types;

pub use claude_adapter::ClaudeCodeAdapter;
pub use executor::AgentExecutor;
pub use normalize::{normalize, transport_fault_event};
pub use types::{
    AgentEvent, AgentRequest, AgentTransport, ContentBlock, EventKind, EventReceiver,
    MessageContent, NormalizedEvent, ResultSummary, TransportError,
};
