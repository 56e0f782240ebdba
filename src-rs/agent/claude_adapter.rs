use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::types::{AgentEvent, AgentRequest, AgentTransport, EventReceiver, TransportError};

const CHANNEL_CAPACITY: usize = 64;
const LINE_PREVIEW: usize = 120;

/// Drives the Claude Code CLI in `stream-json` mode, one JSON event per line.
pub struct ClaudeCodeAdapter {
    binary: String,
}

impl ClaudeCodeAdapter {
    pub fn new(binary: &str) -> Self {
        let binary = if binary.is_empty() { "claude" } else { binary };
        Self {
            binary: binary.to_string(),
        }
    }

    fn command(&self, request: &AgentRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-p")
            .arg(&request.prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose")
            .arg("--permission-mode")
            .arg(request.permission_mode.as_str())
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl AgentTransport for ClaudeCodeAdapter {
    async fn open(&self, request: AgentRequest) -> Result<EventReceiver, TransportError> {
        let mut child = self.command(&request).spawn().map_err(TransportError::Spawn)?;
        info!(
            "agent process {} started in {}",
            child.id().unwrap_or(0),
            request.working_dir.display()
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Spawn(std::io::Error::other("agent stdout not captured")))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TransportError::Spawn(std::io::Error::other("agent stderr not captured")))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                // A dropped receiver means the run was abandoned; returning
                // drops `child`, which kills the process.
                let next = tokio::select! {
                    _ = tx.closed() => return,
                    next = lines.next_line() => next,
                };
                match next {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let item = parse_line(&line);
                        let stop = item.is_err();
                        if tx.send(item).await.is_err() || stop {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        let _ = tx.send(Err(TransportError::Io(err))).await;
                        return;
                    }
                }
            }

            let stderr = stderr_task.await.unwrap_or_default();
            match child.wait().await {
                Ok(status) if status.success() => debug!("agent process exited cleanly"),
                Ok(status) => {
                    let _ = tx
                        .send(Err(TransportError::Exited {
                            code: status.code(),
                            stderr: stderr.trim().to_string(),
                        }))
                        .await;
                }
                Err(err) => {
                    let _ = tx.send(Err(TransportError::Io(err))).await;
                }
            }
        });

        Ok(rx)
    }
}

fn parse_line(line: &str) -> Result<AgentEvent, TransportError> {
    serde_json::from_str(line)
        .map(AgentEvent::from_value)
        .map_err(|err| {
            let preview: String = line.chars().take(LINE_PREVIEW).collect();
            TransportError::MalformedResponse(format!("{} (line: {})", err, preview))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_decodes_json_and_flags_garbage() {
        let event = parse_line(r#"{"type":"result","is_error":false,"num_turns":1}"#).unwrap();
        assert!(matches!(event, AgentEvent::Result(_)));

        let err = parse_line("Error: not json").unwrap_err();
        match err {
            TransportError::MalformedResponse(detail) => assert!(detail.contains("Error: not json")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
