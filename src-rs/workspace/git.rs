use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} failed: {stderr}")]
    Failed { command: String, stderr: String },
}

/// Thin wrapper over the `git` binary scoped to one working tree.
///
/// Every invocation disables interactive credential prompts and is killed
/// when its future is dropped, so a cancelled task never leaves a git
/// process behind.
#[derive(Clone, Debug)]
pub struct Git {
    dir: PathBuf,
}

impl Git {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Clones `url` into `target`, which must be absent or empty.
    pub async fn clone_repository(url: &str, target: &Path) -> Result<(), GitError> {
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg(url).arg(target);
        run_command(cmd, "clone").await.map(|_| ())
    }

    /// True when the working tree root itself holds a repository.
    pub async fn is_repository(&self) -> bool {
        if !self.dir.join(".git").exists() {
            return false;
        }
        self.run(&["rev-parse", "--git-dir"]).await.is_ok()
    }

    pub async fn diff_staged(&self) -> Result<String, GitError> {
        self.run(&["diff", "--cached", "--unified=3"]).await
    }

    pub async fn diff_unstaged(&self) -> Result<String, GitError> {
        self.run(&["diff", "--unified=3"]).await
    }

    pub async fn diff_head(&self) -> Result<String, GitError> {
        self.run(&["diff", "HEAD", "--unified=3"]).await
    }

    /// Untracked paths relative to the working tree, honouring ignore rules.
    pub async fn untracked_files(&self) -> Result<Vec<String>, GitError> {
        let raw = self
            .run(&["ls-files", "--others", "--exclude-standard", "-z"])
            .await?;
        Ok(raw
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// True when the tree has modifications or untracked files.
    pub async fn has_changes(&self) -> Result<bool, GitError> {
        let status = self.run(&["status", "--porcelain"]).await?;
        Ok(!status.trim().is_empty())
    }

    /// The configured URL of `remote`, without `insteadOf` rewriting.
    pub async fn remote_url(&self, remote: &str) -> Result<String, GitError> {
        let key = format!("remote.{}.url", remote);
        let url = self.run(&["config", "--get", &key]).await?;
        Ok(url.trim().to_string())
    }

    pub async fn create_branch(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["checkout", "-b", branch]).await.map(|_| ())
    }

    pub async fn stage_all(&self) -> Result<(), GitError> {
        self.run(&["add", "-A"]).await.map(|_| ())
    }

    pub async fn commit(
        &self,
        message: &str,
        author_name: &str,
        author_email: &str,
    ) -> Result<(), GitError> {
        let name = format!("user.name={}", author_name);
        let email = format!("user.email={}", author_email);
        self.run(&["-c", &name, "-c", &email, "commit", "-m", message])
            .await
            .map(|_| ())
    }

    /// Pushes `branch` to the same-named ref on `remote`.
    ///
    /// `extra_header` is passed as a one-off `http.extraheader` so that
    /// credentials never reach the repository config.
    pub async fn push(
        &self,
        remote: &str,
        branch: &str,
        extra_header: Option<&str>,
    ) -> Result<(), GitError> {
        let refspec = format!("{}:{}", branch, branch);
        let header = extra_header.map(|value| format!("http.extraheader={}", value));
        let mut args: Vec<&str> = Vec::new();
        if let Some(header) = header.as_deref() {
            args.push("-c");
            args.push(header);
        }
        args.extend(["push", remote, refspec.as_str()]);
        self.run(&args).await.map(|_| ())
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.dir);
        let label = args
            .iter()
            .find(|arg| !arg.starts_with('-') && !arg.contains('='))
            .copied()
            .unwrap_or("git");
        run_command(cmd, label).await
    }
}

async fn run_command(mut cmd: Command, label: &str) -> Result<String, GitError> {
    cmd.env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("running git {}", label);
    let output = cmd.output().await.map_err(|source| GitError::Spawn {
        command: label.to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(GitError::Failed {
            command: label.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
