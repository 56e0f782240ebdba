use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Permission mode handed to the coding agent for every task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionMode {
    BypassPermissions,
    AcceptEdits,
    Default,
    Plan,
}

impl PermissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::Default => "default",
            PermissionMode::Plan => "plan",
        }
    }
}

impl FromStr for PermissionMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "bypassPermissions" => Ok(PermissionMode::BypassPermissions),
            "acceptEdits" => Ok(PermissionMode::AcceptEdits),
            "default" => Ok(PermissionMode::Default),
            "plan" => Ok(PermissionMode::Plan),
            other => Err(format!("unknown permission mode: {}", other)),
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workspace_root: PathBuf,
    pub agent_binary: String,
    pub permission_mode: PermissionMode,
    pub github_api_url: String,
    pub commit_author_name: String,
    pub commit_author_email: String,
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workspace_root: std::env::temp_dir(),
            agent_binary: "claude".to_string(),
            permission_mode: PermissionMode::BypassPermissions,
            github_api_url: "https://api.github.com".to_string(),
            commit_author_name: "Task Server".to_string(),
            commit_author_email: "task-server@localhost".to_string(),
            log_dir: None,
        }
    }
}
