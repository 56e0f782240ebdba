use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use tracing::{error, info};

use crate::task::Task;
use crate::workspace::Git;

use super::github::{GithubClient, GithubError, NewPullRequest};
use super::remote::GithubRepo;
use super::types::{PublishError, PullRequestCreated, PullRequestRequest};

const PROMPT_PREVIEW: usize = 60;
const DEFAULT_BASE: &str = "main";
const FALLBACK_BASE: &str = "master";

/// Turns a task's workspace changes into a pushed branch and a pull request.
pub struct Publisher {
    github: GithubClient,
    author_name: String,
    author_email: String,
}

impl Publisher {
    pub fn new(github: GithubClient, author_name: &str, author_email: &str) -> Self {
        Self {
            github,
            author_name: author_name.to_string(),
            author_email: author_email.to_string(),
        }
    }

    pub async fn publish(
        &self,
        task: &Task,
        request: &PullRequestRequest,
    ) -> Result<PullRequestCreated, PublishError> {
        let workspace = task
            .workspace_path
            .as_deref()
            .filter(|path| path.is_dir())
            .ok_or(PublishError::WorkspaceMissing)?;
        let git = Git::new(workspace);
        if !git.is_repository().await {
            return Err(PublishError::NotGitRepository);
        }
        if !git.has_changes().await.map_err(PublishError::Status)? {
            return Err(PublishError::NoChanges);
        }

        let remote_url = git.remote_url("origin").await.map_err(|err| {
            error!("Error getting repository info for task {}: {}", task.id, err);
            PublishError::RemoteUnavailable(err)
        })?;
        info!("Repository origin URL: {}", remote_url);
        let repo = GithubRepo::from_remote_url(&remote_url)?;

        let branch = branch_name(&task.id, Utc::now().timestamp());
        let message = commit_message(&task.prompt, request.title.as_deref());
        self.push_branch(&git, &repo, &branch, &message, &request.token)
            .await
            .map_err(|err| {
                error!("Error creating branch and pushing for task {}: {}", task.id, err);
                PublishError::Branch(err)
            })?;

        let mut pull = NewPullRequest {
            title: request
                .title
                .clone()
                .unwrap_or_else(|| format!("AI Generated Changes: {}", preview(&task.prompt))),
            body: request
                .body
                .clone()
                .unwrap_or_else(|| default_body(task)),
            head: branch.clone(),
            base: DEFAULT_BASE.to_string(),
        };

        let mut result = self
            .github
            .create_pull_request(&repo.owner, &repo.name, &request.token, &pull)
            .await;
        if matches!(&result, Err(err) if err.is_base_rejection()) {
            info!("Main branch not found, trying master branch");
            pull.base = FALLBACK_BASE.to_string();
            result = self
                .github
                .create_pull_request(&repo.owner, &repo.name, &request.token, &pull)
                .await;
        }

        match result {
            Ok(created) => {
                info!("Pull request created successfully: {}", created.html_url);
                Ok(PullRequestCreated {
                    pr_url: created.html_url,
                    pr_number: created.number,
                    branch_name: branch,
                })
            }
            Err(GithubError::Api { status, message, .. }) => Err(PublishError::Api { status, message }),
            Err(GithubError::Http(err)) => Err(PublishError::Http(err)),
        }
    }

    async fn push_branch(
        &self,
        git: &Git,
        repo: &GithubRepo,
        branch: &str,
        message: &str,
        token: &str,
    ) -> Result<(), crate::workspace::GitError> {
        info!("Creating branch: {}", branch);
        git.create_branch(branch).await?;
        git.stage_all().await?;
        git.commit(message, &self.author_name, &self.author_email).await?;

        info!("Pushing branch {} to remote", branch);
        let header = repo.https.then(|| auth_header(token));
        git.push("origin", branch, header.as_deref()).await
    }
}

/// `task-<first 8 chars of id>-<unix seconds>`.
pub fn branch_name(task_id: &str, timestamp: i64) -> String {
    let short_id: String = task_id.chars().take(8).collect();
    format!("task-{}-{}", short_id, timestamp)
}

pub fn commit_message(prompt: &str, title: Option<&str>) -> String {
    match title {
        Some(title) if !title.trim().is_empty() => title.to_string(),
        _ => format!("Task: {}", preview(prompt)),
    }
}

fn preview(prompt: &str) -> String {
    match prompt.char_indices().nth(PROMPT_PREVIEW) {
        Some((cut, _)) => format!("{}...", &prompt[..cut]),
        None => prompt.to_string(),
    }
}

fn auth_header(token: &str) -> String {
    let credentials = STANDARD.encode(format!("x-access-token:{}", token));
    format!("AUTHORIZATION: basic {}", credentials)
}

fn default_body(task: &Task) -> String {
    format!(
        "## AI Generated Changes\n\n**Task:** {}\n\n**Task ID:** {}\n\nThis pull request contains changes generated by an AI coding assistant.\n\n### Changes Summary\nThis PR includes the modifications made to fulfill the requested task.\n\n---\n*Generated automatically by task-server*",
        task.prompt, task.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_name_uses_short_id_and_timestamp() {
        assert_eq!(
            branch_name("3f2a9c1e-aaaa-bbbb-cccc-000000000000", 1_700_000_000),
            "task-3f2a9c1e-1700000000"
        );
    }

    #[test]
    fn commit_message_prefers_title_and_truncates_prompt() {
        assert_eq!(commit_message("short prompt", None), "Task: short prompt");
        assert_eq!(commit_message("short prompt", Some("Add docs")), "Add docs");
        assert_eq!(commit_message("short prompt", Some("  ")), "Task: short prompt");

        let long = "a".repeat(61);
        assert_eq!(commit_message(&long, None), format!("Task: {}...", "a".repeat(60)));
        let exact = "b".repeat(60);
        assert_eq!(commit_message(&exact, None), format!("Task: {}", exact));
    }

    #[test]
    fn auth_header_encodes_token_as_basic_credentials() {
        assert_eq!(
            auth_header("secret"),
            format!("AUTHORIZATION: basic {}", STANDARD.encode("x-access-token:secret"))
        );
    }
}
