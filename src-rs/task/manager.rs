use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::agent::{AgentExecutor, NormalizedEvent, TransportError};
use crate::content::{ContentResolver, TaskContent};
use crate::publish::{PublishError, Publisher, PullRequestCreated, PullRequestRequest};
use crate::workspace::{RepositoryRef, WorkspaceError, WorkspaceProvisioner};

use super::store::{PublishSlot, TaskStore};
use super::types::{Task, TaskStatus, TaskSummary};

/// Fatal outcome of a task's background execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Agent(#[from] TransportError),

    #[error("failed to serialize task output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Owns the task registry and runs each task as its own background job.
pub struct TaskManager {
    store: Arc<TaskStore>,
    provisioner: Arc<WorkspaceProvisioner>,
    executor: Arc<AgentExecutor>,
    content: ContentResolver,
    publisher: Publisher,
}

impl TaskManager {
    pub fn new(provisioner: WorkspaceProvisioner, executor: AgentExecutor, publisher: Publisher) -> Self {
        Self {
            store: Arc::new(TaskStore::new()),
            provisioner: Arc::new(provisioner),
            executor: Arc::new(executor),
            content: ContentResolver::new(),
            publisher,
        }
    }

    /// Registers a `Running` task and schedules its execution.
    ///
    /// Returns as soon as the task is registered; must be called from
    /// within a Tokio runtime.
    pub fn submit(&self, prompt: &str, repository: Option<RepositoryRef>) -> Task {
        let (task, cancel) = self.store.create(prompt);
        info!(
            "Starting task execution - Task ID: {}, Repository: {}",
            task.id,
            repository.as_ref().map(|r| r.as_str()).unwrap_or("none")
        );

        let job = Job {
            store: Arc::clone(&self.store),
            provisioner: Arc::clone(&self.provisioner),
            executor: Arc::clone(&self.executor),
            task_id: task.id.clone(),
            prompt: task.prompt.clone(),
            repository,
            cancel,
        };

        let store = Arc::clone(&self.store);
        let task_id = task.id.clone();
        let handle = tokio::spawn(job.run());
        tokio::spawn(async move {
            if let Err(err) = handle.await {
                error!("Task {}: background execution aborted: {}", task_id, err);
                store.fail(&task_id, format!("task execution aborted: {}", err));
            }
        });

        task
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        let task = self.store.get(id);
        if task.is_none() {
            warn!("Task not found: {}", id);
        }
        task
    }

    pub fn list(&self) -> Vec<TaskSummary> {
        self.store.list()
    }

    pub fn list_running(&self) -> Vec<TaskSummary> {
        self.list()
            .into_iter()
            .filter(|task| task.status == TaskStatus::Running)
            .collect()
    }

    pub fn list_completed(&self) -> Vec<TaskSummary> {
        self.list()
            .into_iter()
            .filter(|task| task.status.is_terminal())
            .collect()
    }

    /// Forgets the task, stops its execution and removes its workspace.
    ///
    /// A workspace that cannot be removed is logged; the task is gone from
    /// the registry either way.
    pub async fn delete(&self, id: &str) -> bool {
        info!("Deleting task: {}", id);
        let task = match self.store.remove(id) {
            Some(task) => task,
            None => {
                warn!("Task not found for deletion: {}", id);
                return false;
            }
        };

        if let Some(dir) = task.workspace_path {
            remove_workspace(&dir).await;
        }
        info!("Task {} deleted", id);
        true
    }

    pub async fn content(&self, id: &str) -> Option<TaskContent> {
        let workspace = match self.store.workspace(id) {
            Some(workspace) => workspace,
            None => {
                warn!("Task not found when getting content: {}", id);
                return None;
            }
        };
        Some(self.content.resolve(workspace.as_deref()).await)
    }

    /// Publishes the task's changes. At most one publish per task runs at a time.
    pub async fn create_pull_request(
        &self,
        id: &str,
        request: &PullRequestRequest,
    ) -> Result<PullRequestCreated, PublishError> {
        info!("Creating pull request for task: {}", id);
        let guard = match self.store.begin_publish(id) {
            PublishSlot::Acquired(guard) => guard,
            PublishSlot::Busy => return Err(PublishError::InProgress),
            PublishSlot::NotFound => {
                warn!("Task not found for PR creation: {}", id);
                return Err(PublishError::TaskNotFound);
            }
        };
        self.publisher.publish(guard.task(), request).await
    }
}

struct Job {
    store: Arc<TaskStore>,
    provisioner: Arc<WorkspaceProvisioner>,
    executor: Arc<AgentExecutor>,
    task_id: String,
    prompt: String,
    repository: Option<RepositoryRef>,
    cancel: CancellationToken,
}

impl Job {
    async fn run(self) {
        let id = self.task_id.clone();
        let outcome = match self.provision().await {
            Ok(Some(workspace)) => {
                let cancel = self.cancel.clone();
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Task {}: cancelled, stopping execution", id);
                        // The agent may have written files after `delete` removed the directory.
                        remove_workspace(&workspace).await;
                        return;
                    }
                    outcome = self.execute(&workspace) => outcome,
                }
            }
            Ok(None) => return,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(output) => {
                if self.store.complete(&id, output).is_some() {
                    info!("Task {}: marked as completed", id);
                }
            }
            Err(err) => {
                error!("Task {}: failed - {}", id, err);
                self.store.fail(&id, err.to_string());
            }
        }
    }

    /// Creates the workspace and records it. `Ok(None)` if the task was
    /// deleted in the meantime, in which case the directory is removed again.
    async fn provision(&self) -> Result<Option<std::path::PathBuf>, ExecutionError> {
        let workspace = self.provisioner.provision(&self.task_id).await?;
        if self.store.assign_workspace(&self.task_id, &workspace) {
            return Ok(Some(workspace));
        }
        info!("Task {}: deleted during provisioning", self.task_id);
        remove_workspace(&workspace).await;
        Ok(None)
    }

    async fn execute(&self, workspace: &Path) -> Result<String, ExecutionError> {
        if let Some(repository) = &self.repository {
            self.provisioner.clone_repository(workspace, repository).await?;
            info!("Task {}: repository cloned", self.task_id);
        }

        let events: Vec<NormalizedEvent> = self.executor.run(workspace, &self.prompt).await?;
        info!("Task {}: agent produced {} events", self.task_id, events.len());
        Ok(serde_json::to_string(&events)?)
    }
}

const REMOVE_ATTEMPTS: u32 = 5;

/// Removes a workspace directory, retrying while a stopping agent may still
/// be creating files in it. A directory that is already gone counts as removed.
async fn remove_workspace(dir: &Path) {
    for attempt in 1..=REMOVE_ATTEMPTS {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {
                info!("Cleaned up workspace {}", dir.display());
                return;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => return,
            Err(err) if attempt == REMOVE_ATTEMPTS => {
                error!("Error cleaning up workspace {}: {}", dir.display(), err);
            }
            Err(err) => {
                warn!("Retrying cleanup of workspace {}: {}", dir.display(), err);
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}
