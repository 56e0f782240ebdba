mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use task_server_rs::api::{router, with_middleware};
use task_server_rs::task::TaskManager;

use common::{happy_script, manager, wait_for_terminal, ScriptedTransport};

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn app(root: &std::path::Path) -> (Router, Arc<TaskManager>) {
    let transport = Arc::new(ScriptedTransport::new(happy_script()).writing("hello.txt", b"hello\n"));
    let manager = Arc::new(manager(root, transport));
    (router(manager.clone()), manager)
}

#[tokio::test]
async fn health_reports_ok() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = app(root.path());

    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn execute_validates_its_input_before_creating_a_task() {
    let root = tempfile::tempdir().unwrap();
    let (app, manager) = app(root.path());

    let (status, body) = call(&app, Method::POST, "/execute", Some(json!({"repository": "a/b"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing 'task' field"}));

    let (status, body) = call(&app, Method::POST, "/execute", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'task' field");

    let (status, body) = call(
        &app,
        Method::POST,
        "/execute",
        Some(json!({"task": "fix", "repository": "not a valid ref!"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid repository format"));

    assert!(manager.list().is_empty());
    let (_, body) = call(&app, Method::GET, "/tasks", None).await;
    assert_eq!(body, json!({"tasks": [], "total": 0}));
}

#[tokio::test]
async fn submitted_task_can_be_inspected_and_deleted() {
    let root = tempfile::tempdir().unwrap();
    let (app, manager) = app(root.path());

    let (status, body) = call(&app, Method::POST, "/execute", Some(json!({"task": "say hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task submitted for execution");
    let task_id = body["task_id"].as_str().unwrap().to_string();

    wait_for_terminal(&manager, &task_id).await;

    let (status, task) = call(&app, Method::GET, &format!("/status/{}", task_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["id"], task_id.as_str());
    assert_eq!(task["task"], "say hello");
    assert_eq!(task["status"], "completed");
    assert_eq!(task["return_code"], 0);
    assert!(task["error"].is_null());
    assert!(task["start_time"].is_string() && task["end_time"].is_string());
    assert!(task["temp_dir"].is_string());
    let events: Value = serde_json::from_str(task["output"].as_str().unwrap()).unwrap();
    assert_eq!(events[0]["type"], "SystemMessage");

    let (status, content) = call(&app, Method::GET, &format!("/content/{}", task_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content["task_id"], task_id.as_str());
    assert_eq!(content["is_git_repo"], false);
    assert_eq!(content["content_type"], "files");
    assert_eq!(content["count"], 1);
    assert_eq!(content["content"][0]["path"], "hello.txt");
    assert_eq!(content["content"][0]["type"], "txt");
    assert_eq!(content["content"][0]["content"], "hello\n");

    let (_, listing) = call(&app, Method::GET, "/completed", None).await;
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["completed_tasks"][0]["id"], task_id.as_str());
    assert!(listing["completed_tasks"][0].get("output").is_none());
    let (_, listing) = call(&app, Method::GET, "/running", None).await;
    assert_eq!(listing, json!({"running_tasks": [], "count": 0}));

    let (status, body) = call(&app, Method::DELETE, &format!("/delete/{}", task_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Task deleted successfully", "task_id": task_id}));

    let (status, body) = call(&app, Method::GET, &format!("/status/{}", task_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Task not found"}));
}

#[tokio::test]
async fn unknown_tasks_are_not_found() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = app(root.path());

    for (method, uri) in [
        (Method::GET, "/status/missing"),
        (Method::GET, "/content/missing"),
        (Method::DELETE, "/delete/missing"),
    ] {
        let (status, body) = call(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], "Task not found");
    }
}

#[tokio::test]
async fn create_pr_requires_a_body_and_a_token() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = app(root.path());

    let (status, body) = call(&app, Method::POST, "/create-pr/missing", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Request body required"}));

    let (status, body) = call(&app, Method::POST, "/create-pr/missing", Some(json!({"pr_title": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "GitHub token is required"}));

    let (status, body) = call(
        &app,
        Method::POST,
        "/create-pr/missing",
        Some(json!({"github_token": "ghp_test"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Task not found"}));
}

#[tokio::test]
async fn create_pr_reports_publish_preconditions() {
    let root = tempfile::tempdir().unwrap();
    let (app, manager) = app(root.path());

    let task = manager.submit("plain workspace", None);
    wait_for_terminal(&manager, &task.id).await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/create-pr/{}", task.id),
        Some(json!({"github_token": "ghp_test", "pr_title": "Title"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Task is not in a git repository"}));
}

async fn exploding_handler() -> &'static str {
    panic!("database password is hunter2")
}

#[tokio::test]
async fn panicking_handler_answers_with_the_generic_500_body() {
    let app = with_middleware(Router::new().route("/boom", get(exploding_handler)));

    let (status, body) = call(&app, Method::GET, "/boom", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}
