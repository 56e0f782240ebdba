#![allow(dead_code)]

use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};

use task_server_rs::agent::{AgentEvent, AgentRequest, AgentTransport, EventReceiver, TransportError};
use task_server_rs::config::ServerConfig;
use task_server_rs::helpers::build_manager_with_transport;
use task_server_rs::task::{Task, TaskManager};

pub enum Step {
    Event(Value),
    Malformed(&'static str),
    Exit(i32),
}

/// In-process agent that replays a fixed script.
///
/// Optionally writes files into the workspace first and waits for the gate
/// before emitting anything. A churning transport keeps creating files in the
/// workspace until its receiver is dropped.
pub struct ScriptedTransport {
    steps: Vec<Step>,
    files: Vec<(String, Vec<u8>)>,
    gate: Option<Arc<Notify>>,
    churn: bool,
    pub requests: Mutex<Vec<AgentRequest>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            files: Vec::new(),
            gate: None,
            churn: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn writing(mut self, path: &str, bytes: &[u8]) -> Self {
        self.files.push((path.to_string(), bytes.to_vec()));
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn churning(mut self) -> Self {
        self.churn = true;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn open(&self, request: AgentRequest) -> Result<EventReceiver, TransportError> {
        for (path, bytes) in &self.files {
            std::fs::write(request.working_dir.join(path), bytes).map_err(TransportError::Io)?;
        }
        let request_dir = request.working_dir.clone();
        self.requests.lock().unwrap().push(request);

        let items: Vec<Result<AgentEvent, TransportError>> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Event(value) => Ok(AgentEvent::from_value(value.clone())),
                Step::Malformed(detail) => Err(TransportError::MalformedResponse(detail.to_string())),
                Step::Exit(code) => Err(TransportError::Exited {
                    code: Some(*code),
                    stderr: "agent crashed".to_string(),
                }),
            })
            .collect();

        let gate = self.gate.clone();
        let (tx, rx) = mpsc::channel(16);
        if self.churn {
            let dir = request_dir;
            tokio::spawn(async move {
                let mut n = 0u32;
                while !tx.is_closed() {
                    let _ = std::fs::write(dir.join(format!("churn_{}.txt", n)), b"x");
                    n += 1;
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
            });
            return Ok(rx);
        }
        tokio::spawn(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            for item in items {
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

pub fn happy_script() -> Vec<Step> {
    vec![
        Step::Event(json!({"type": "system", "subtype": "init", "cwd": "/w"})),
        Step::Event(json!({
            "type": "assistant",
            "message": {"content": [{"type": "text", "text": "Done."}]}
        })),
        Step::Event(json!({
            "type": "result",
            "total_cost_usd": 0.0123,
            "duration_ms": 1500,
            "num_turns": 2,
            "is_error": false
        })),
    ]
}

pub fn manager(root: &Path, transport: Arc<ScriptedTransport>) -> TaskManager {
    manager_with_github(root, transport, "https://api.github.com")
}

pub fn manager_with_github(root: &Path, transport: Arc<ScriptedTransport>, github_api_url: &str) -> TaskManager {
    let config = ServerConfig {
        workspace_root: root.to_path_buf(),
        github_api_url: github_api_url.to_string(),
        ..ServerConfig::default()
    };
    build_manager_with_transport(&config, transport).unwrap()
}

pub async fn wait_for_terminal(manager: &TaskManager, id: &str) -> Task {
    for _ in 0..500 {
        let task = manager.get(id).expect("task disappeared");
        if task.status.is_terminal() {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("task {} never finished", id);
}

pub async fn wait_for_workspace(manager: &TaskManager, id: &str) -> std::path::PathBuf {
    for _ in 0..500 {
        if let Some(dir) = manager.get(id).and_then(|task| task.workspace_path) {
            return dir;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("task {} never got a workspace", id);
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com", "-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git not available");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A repository with one commit containing `README.md`.
pub fn init_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    std::fs::write(dir.join("README.md"), "# demo\n").unwrap();
    git(dir, &["add", "README.md"]);
    git(dir, &["commit", "-q", "-m", "initial"]);
}
