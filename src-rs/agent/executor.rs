use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::PermissionMode;

use super::normalize::{normalize, transport_fault_event};
use super::types::{AgentRequest, AgentTransport, NormalizedEvent, TransportError};

/// Runs the coding agent against a workspace and collects its normalized log.
#[derive(Clone)]
pub struct AgentExecutor {
    transport: Arc<dyn AgentTransport>,
    permission_mode: PermissionMode,
}

impl AgentExecutor {
    pub fn new(transport: Arc<dyn AgentTransport>, permission_mode: PermissionMode) -> Self {
        Self {
            transport,
            permission_mode,
        }
    }

    /// Drains the agent's event stream.
    ///
    /// A malformed response replaces the whole log with one synthetic
    /// `ErrorMessage` event and still counts as success; every other
    /// transport fault is returned to the caller.
    pub async fn run(&self, workspace: &Path, prompt: &str) -> Result<Vec<NormalizedEvent>, TransportError> {
        let request = AgentRequest {
            prompt: prompt.to_string(),
            working_dir: workspace.to_path_buf(),
            permission_mode: self.permission_mode,
        };
        let mut events = self.transport.open(request).await?;
        let mut log = Vec::new();

        while let Some(item) = events.recv().await {
            match item {
                Ok(event) => {
                    let normalized = normalize(&event);
                    debug!("agent event {:?}", normalized.kind);
                    log.push(normalized);
                }
                Err(TransportError::MalformedResponse(detail)) => {
                    warn!("agent transport fault in {}: {}", workspace.display(), detail);
                    return Ok(vec![transport_fault_event(&detail)]);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(log)
    }
}
