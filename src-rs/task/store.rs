use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use super::types::{Task, TaskStatus, TaskSummary};

struct TaskEntry {
    task: Task,
    cancel: CancellationToken,
    publishing: bool,
}

/// Process-lifetime task registry.
///
/// Every read and write goes through the one mutex; callers copy what they
/// need out of it and never hold it across I/O.
pub struct TaskStore {
    tasks: Mutex<HashMap<String, TaskEntry>>,
}

pub enum PublishSlot<'a> {
    NotFound,
    Busy,
    Acquired(PublishGuard<'a>),
}

/// Marks a task as having a publish in flight until dropped.
pub struct PublishGuard<'a> {
    store: &'a TaskStore,
    task: Task,
}

impl PublishGuard<'_> {
    pub fn task(&self) -> &Task {
        &self.task
    }
}

impl Drop for PublishGuard<'_> {
    fn drop(&mut self) {
        if let Some(entry) = self.store.lock().get_mut(&self.task.id) {
            entry.publishing = false;
        }
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a fresh `Running` task and returns it with its cancel token.
    pub fn create(&self, prompt: &str) -> (Task, CancellationToken) {
        let task = Task::new(next_id(), prompt, Utc::now());
        let cancel = CancellationToken::new();
        self.lock().insert(
            task.id.clone(),
            TaskEntry {
                task: task.clone(),
                cancel: cancel.clone(),
                publishing: false,
            },
        );
        (task, cancel)
    }

    /// Records the task's workspace. Returns false if the task is gone.
    pub fn assign_workspace(&self, id: &str, path: &Path) -> bool {
        match self.lock().get_mut(id) {
            Some(entry) => {
                entry.task.workspace_path = Some(path.to_path_buf());
                true
            }
            None => false,
        }
    }

    pub fn complete(&self, id: &str, output: String) -> Option<Task> {
        self.finish(id, |task| {
            task.status = TaskStatus::Completed;
            task.output = Some(output);
            task.exit_code = Some(0);
        })
    }

    pub fn fail(&self, id: &str, message: String) -> Option<Task> {
        self.finish(id, |task| {
            task.status = TaskStatus::Failed;
            task.error_message = Some(message);
            task.exit_code = Some(-1);
        })
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.lock().get(id).map(|entry| entry.task.clone())
    }

    /// `None` when the task is unknown, `Some(None)` before provisioning.
    pub fn workspace(&self, id: &str) -> Option<Option<PathBuf>> {
        self.lock()
            .get(id)
            .map(|entry| entry.task.workspace_path.clone())
    }

    pub fn list(&self) -> Vec<TaskSummary> {
        let map = self.lock();
        let mut items: Vec<TaskSummary> = map.values().map(|entry| TaskSummary::from(&entry.task)).collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    /// Removes the task and signals its background execution to stop.
    pub fn remove(&self, id: &str) -> Option<Task> {
        let entry = self.lock().remove(id)?;
        entry.cancel.cancel();
        Some(entry.task)
    }

    pub fn begin_publish(&self, id: &str) -> PublishSlot<'_> {
        let mut map = self.lock();
        let entry = match map.get_mut(id) {
            Some(entry) => entry,
            None => return PublishSlot::NotFound,
        };
        if entry.publishing {
            return PublishSlot::Busy;
        }
        entry.publishing = true;
        let task = entry.task.clone();
        drop(map);
        PublishSlot::Acquired(PublishGuard { store: self, task })
    }

    fn finish(&self, id: &str, apply: impl FnOnce(&mut Task)) -> Option<Task> {
        let mut map = self.lock();
        let entry = map.get_mut(id)?;
        if entry.task.status.is_terminal() {
            warn!("Task {}: ignoring second terminal transition", id);
            return None;
        }
        apply(&mut entry.task);
        entry.task.finished_at = Some(Utc::now());
        Some(entry.task.clone())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TaskEntry>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

fn next_id() -> String {
    Uuid::new_v4().to_string()
}
