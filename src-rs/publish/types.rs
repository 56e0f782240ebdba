use serde::Serialize;

use crate::workspace::GitError;

#[derive(Clone, Debug)]
pub struct PullRequestRequest {
    pub token: String,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PullRequestCreated {
    pub pr_url: String,
    pub pr_number: u64,
    pub branch_name: String,
}

/// Every way a publish can fail. The display text is what clients see.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Task not found")]
    TaskNotFound,

    #[error("Pull request creation already in progress")]
    InProgress,

    #[error("Task directory not found")]
    WorkspaceMissing,

    #[error("Task is not in a git repository")]
    NotGitRepository,

    #[error("No changes to create pull request")]
    NoChanges,

    #[error("Unable to inspect working tree: {0}")]
    Status(#[source] GitError),

    #[error("Unable to get repository information")]
    RemoteUnavailable(#[source] GitError),

    #[error("Repository is not hosted on GitHub")]
    UnsupportedHost(String),

    #[error("Unable to parse GitHub repository URL")]
    UnparseableRemote(String),

    #[error("Failed to create branch: {0}")]
    Branch(#[source] GitError),

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to create pull request: {0}")]
    Http(#[source] reqwest::Error),
}
