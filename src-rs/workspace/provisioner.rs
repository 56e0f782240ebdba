use std::path::{Path, PathBuf};

use tracing::{error, info};
use uuid::Uuid;

use super::error::WorkspaceError;
use super::git::Git;
use super::repository::RepositoryRef;

/// Creates one isolated directory per task under a fixed root.
///
/// Workspaces are never removed here; they outlive their task's execution
/// and are reclaimed only when the task is deleted.
#[derive(Clone, Debug)]
pub struct WorkspaceProvisioner {
    root: PathBuf,
}

impl WorkspaceProvisioner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn provision(&self, task_id: &str) -> Result<PathBuf, WorkspaceError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: self.root.clone(),
                source,
            })?;

        let short_id: String = task_id.chars().take(8).collect();
        let suffix = Uuid::new_v4().simple().to_string();
        let path = self
            .root
            .join(format!("task_{}_{}", short_id, &suffix[..8]));

        tokio::fs::create_dir(&path)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: path.clone(),
                source,
            })?;
        info!("Task {}: created workspace {}", task_id, path.display());
        Ok(path)
    }

    pub async fn clone_repository(
        &self,
        workspace: &Path,
        repository: &RepositoryRef,
    ) -> Result<(), WorkspaceError> {
        info!(
            "Cloning repository {} into {}",
            repository.clone_url(),
            workspace.display()
        );
        Git::clone_repository(repository.clone_url(), workspace)
            .await
            .map_err(|source| {
                error!("Error cloning repository {}: {}", repository, source);
                WorkspaceError::Clone {
                    repository: repository.to_string(),
                    source,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn provision_creates_distinct_directories_under_root() {
        let root = tempfile::tempdir().unwrap();
        let provisioner = WorkspaceProvisioner::new(root.path());

        let first = provisioner.provision("0123456789abcdef").await.unwrap();
        let second = provisioner.provision("0123456789abcdef").await.unwrap();

        assert_ne!(first, second);
        assert!(first.is_dir() && second.is_dir());
        assert!(first.starts_with(root.path()));
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("task_01234567_"), "unexpected name {}", name);
    }

    #[tokio::test]
    async fn provision_fails_when_root_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("occupied");
        std::fs::write(&blocker, b"x").unwrap();

        let provisioner = WorkspaceProvisioner::new(&blocker);
        let err = provisioner.provision("abc").await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Create { .. }));
    }

    #[tokio::test]
    async fn clone_failure_is_reported_with_the_repository() {
        let root = tempfile::tempdir().unwrap();
        let provisioner = std::sync::Arc::new(WorkspaceProvisioner::new(root.path()));
        let workspace = provisioner.provision("feedface").await.unwrap();
        let repository = RepositoryRef::parse("https://127.0.0.1:9/nobody/missing.git").unwrap();

        let err = provisioner
            .clone_repository(&workspace, &repository)
            .await
            .unwrap_err();
        match err {
            WorkspaceError::Clone { repository, .. } => {
                assert_eq!(repository, "https://127.0.0.1:9/nobody/missing.git")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
