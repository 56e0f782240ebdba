use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::content::TaskContent;
use crate::error::{ApiError, ApiResult};
use crate::publish::PullRequestRequest;
use crate::task::{Task, TaskManager};
use crate::workspace::RepositoryRef;

type AppState = State<Arc<TaskManager>>;

const TASK_NOT_FOUND: &str = "Task not found";

pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

pub async fn handle_execute(
    State(manager): AppState,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let body = body.map(|Json(body)| body).unwrap_or(Value::Null);
    info!("Received execute request: {}", body);

    let prompt = match body.get("task").and_then(Value::as_str) {
        Some(prompt) => prompt,
        None => {
            warn!("Missing 'task' field in request");
            return Err(ApiError::BadRequest("Missing 'task' field".to_string()));
        }
    };

    let repository = match body.get("repository").and_then(Value::as_str) {
        Some(raw) if !raw.trim().is_empty() => Some(
            RepositoryRef::parse(raw).map_err(|err| ApiError::BadRequest(err.to_string()))?,
        ),
        _ => None,
    };

    let task = manager.submit(prompt, repository);
    info!("Task submitted successfully with ID: {}", task.id);
    Ok(Json(json!({
        "task_id": task.id,
        "message": "Task submitted for execution",
    })))
}

pub async fn handle_status(
    State(manager): AppState,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    debug!("Status request for task: {}", task_id);
    manager
        .get(&task_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))
}

pub async fn handle_tasks(State(manager): AppState) -> Json<Value> {
    let tasks = manager.list();
    Json(json!({"total": tasks.len(), "tasks": tasks}))
}

pub async fn handle_running(State(manager): AppState) -> Json<Value> {
    let tasks = manager.list_running();
    Json(json!({"count": tasks.len(), "running_tasks": tasks}))
}

pub async fn handle_completed(State(manager): AppState) -> Json<Value> {
    let tasks = manager.list_completed();
    Json(json!({"count": tasks.len(), "completed_tasks": tasks}))
}

pub async fn handle_content(
    State(manager): AppState,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    debug!("Content request for task: {}", task_id);
    let content = manager
        .content(&task_id)
        .await
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?;

    let mut response = json!({
        "task_id": task_id,
        "is_git_repo": content.is_version_controlled(),
        "content_type": content.content_type(),
    });
    match content {
        TaskContent::Diff(diff) => {
            response["content"] = json!(diff);
        }
        TaskContent::Files(files) => {
            response["count"] = json!(files.len());
            response["content"] = json!(files);
        }
    }
    Ok(Json(response))
}

pub async fn handle_delete(
    State(manager): AppState,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    info!("Delete request for task: {}", task_id);
    if !manager.delete(&task_id).await {
        return Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()));
    }
    Ok(Json(json!({
        "message": "Task deleted successfully",
        "task_id": task_id,
    })))
}

pub async fn handle_create_pr(
    State(manager): AppState,
    Path(task_id): Path<String>,
    body: Option<Json<Value>>,
) -> ApiResult<Response> {
    info!("PR creation request for task: {}", task_id);
    let body = match body {
        Some(Json(body)) if body.is_object() => body,
        _ => return Err(ApiError::BadRequest("Request body required".to_string())),
    };

    let token = match body.get("github_token").and_then(Value::as_str) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => return Err(ApiError::BadRequest("GitHub token is required".to_string())),
    };
    let request = PullRequestRequest {
        token,
        title: optional_string(&body, "pr_title"),
        body: optional_string(&body, "pr_body"),
    };

    let response = match manager.create_pull_request(&task_id, &request).await {
        Ok(created) => Json(json!({
            "success": true,
            "pr_url": created.pr_url,
            "pr_number": created.pr_number,
            "branch_name": created.branch_name,
            "message": "Pull request created successfully",
        }))
        .into_response(),
        Err(err) => {
            warn!("Pull request for task {} failed: {}", task_id, err);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"success": false, "error": err.to_string()})),
            )
                .into_response()
        }
    };
    Ok(response)
}

fn optional_string(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
