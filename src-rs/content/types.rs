use serde::{Deserialize, Serialize};

pub const BINARY_PLACEHOLDER: &str = "[Binary file]";

/// What a task's workspace currently holds, as shown to clients.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskContent {
    /// Combined diff of a version-controlled workspace; `None` when there is
    /// nothing to show or the diff could not be computed.
    Diff(Option<String>),
    /// Every file of a plain workspace.
    Files(Vec<WorkspaceFile>),
}

impl TaskContent {
    pub fn is_version_controlled(&self) -> bool {
        matches!(self, TaskContent::Diff(_))
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            TaskContent::Diff(_) => "diff",
            TaskContent::Files(_) => "files",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceFile {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub content: String,
    pub size: u64,
}
