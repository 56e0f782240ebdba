use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Full task record, serialized with the field names clients already use.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "task")]
    pub prompt: String,
    pub status: TaskStatus,
    #[serde(rename = "start_time")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "end_time")]
    pub finished_at: Option<DateTime<Utc>>,
    pub output: Option<String>,
    #[serde(rename = "error")]
    pub error_message: Option<String>,
    #[serde(rename = "return_code")]
    pub exit_code: Option<i32>,
    #[serde(rename = "temp_dir")]
    pub workspace_path: Option<PathBuf>,
}

impl Task {
    pub fn new(id: String, prompt: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            status: TaskStatus::Running,
            created_at,
            finished_at: None,
            output: None,
            error_message: None,
            exit_code: None,
            workspace_path: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    #[serde(rename = "task")]
    pub prompt: String,
    pub status: TaskStatus,
    #[serde(rename = "start_time")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "end_time")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(rename = "return_code")]
    pub exit_code: Option<i32>,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            prompt: task.prompt.clone(),
            status: task.status,
            created_at: task.created_at,
            finished_at: task.finished_at,
            exit_code: task.exit_code,
        }
    }
}
