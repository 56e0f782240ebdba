use std::path::PathBuf;

use super::git::GitError;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid repository format: {0}")]
    InvalidRepository(String),

    #[error("Failed to clone repository: {repository} ({source})")]
    Clone {
        repository: String,
        #[source]
        source: GitError,
    },
}
