use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct CLIConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub repository: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteRequest {
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteResponse {
    pub task_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskInfo {
    pub id: String,
    pub task: String,
    pub status: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub return_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct TaskDetail {
    pub id: String,
    pub task: String,
    pub status: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub return_code: Option<i32>,
    pub temp_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    pub task_id: String,
    pub is_git_repo: bool,
    pub content_type: String,
    pub content: Value,
}

#[derive(Debug, Serialize)]
pub struct PullRequestBody {
    pub github_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestResponse {
    pub success: bool,
    pub pr_url: Option<String>,
    pub pr_number: Option<u64>,
    pub branch_name: Option<String>,
    pub error: Option<String>,
}
