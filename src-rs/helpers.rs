use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::agent::{AgentExecutor, AgentTransport, ClaudeCodeAdapter};
use crate::config::{PermissionMode, ServerConfig};
use crate::publish::{GithubClient, Publisher};
use crate::task::TaskManager;
use crate::workspace::WorkspaceProvisioner;

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Applies the `TASK_SERVER_*`, `PORT` and `GITHUB_API_URL` variables on top
/// of `base`. Unset or blank variables leave the field alone.
pub fn load_config_from_env(base: ServerConfig) -> anyhow::Result<ServerConfig> {
    let mut cfg = base;

    if let Some(host) = env_value("TASK_SERVER_HOST") {
        cfg.host = host;
    }
    if let Some(port) = env_value("PORT") {
        cfg.port = port
            .parse()
            .with_context(|| format!("PORT is not a valid port number: {}", port))?;
    }
    if let Some(root) = env_value("TASK_SERVER_WORKSPACE_ROOT") {
        cfg.workspace_root = PathBuf::from(root);
    }
    if let Some(binary) = env_value("TASK_SERVER_AGENT_BINARY") {
        cfg.agent_binary = binary;
    }
    if let Some(mode) = env_value("TASK_SERVER_PERMISSION_MODE") {
        cfg.permission_mode = mode.parse::<PermissionMode>().map_err(anyhow::Error::msg)?;
    }
    if let Some(url) = env_value("GITHUB_API_URL") {
        cfg.github_api_url = url;
    }
    if let Some(name) = env_value("TASK_SERVER_GIT_NAME") {
        cfg.commit_author_name = name;
    }
    if let Some(email) = env_value("TASK_SERVER_GIT_EMAIL") {
        cfg.commit_author_email = email;
    }
    if let Some(dir) = env_value("TASK_SERVER_LOG_DIR") {
        cfg.log_dir = Some(PathBuf::from(dir));
    }

    Ok(cfg)
}

/// Wires a manager around the Claude Code CLI.
pub fn build_manager(cfg: &ServerConfig) -> anyhow::Result<TaskManager> {
    let transport = Arc::new(ClaudeCodeAdapter::new(&cfg.agent_binary));
    build_manager_with_transport(cfg, transport)
}

/// Same as [`build_manager`] with a caller-chosen agent transport.
pub fn build_manager_with_transport(
    cfg: &ServerConfig,
    transport: Arc<dyn AgentTransport>,
) -> anyhow::Result<TaskManager> {
    let github = GithubClient::new(&cfg.github_api_url).context("failed to build GitHub client")?;
    Ok(TaskManager::new(
        WorkspaceProvisioner::new(cfg.workspace_root.clone()),
        AgentExecutor::new(transport, cfg.permission_mode),
        Publisher::new(github, &cfg.commit_author_name, &cfg.commit_author_email),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_builds_from_default_config() {
        let cfg = ServerConfig::default();
        assert!(build_manager(&cfg).is_ok());
    }
}
