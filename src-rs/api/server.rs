use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{
    handle_completed, handle_content, handle_create_pr, handle_delete, handle_execute,
    handle_health, handle_running, handle_status, handle_tasks,
};
use crate::config::ServerConfig;
use crate::error::panic_response;
use crate::task::TaskManager;

pub struct TaskServer {
    pub config: ServerConfig,
    pub manager: Arc<TaskManager>,
}

impl TaskServer {
    pub fn new(config: ServerConfig, manager: TaskManager) -> Self {
        Self {
            config,
            manager: Arc::new(manager),
        }
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        let addr: SocketAddr = self
            .config
            .server_address()
            .parse()
            .with_context(|| format!("invalid listen address {}", self.config.server_address()))?;

        info!("Task server listening on {}", addr);
        axum::Server::try_bind(&addr)
            .with_context(|| format!("failed to bind {}", addr))?
            .serve(router(self.manager.clone()).into_make_service())
            .await
            .context("server terminated unexpectedly")
    }
}

pub fn router(manager: Arc<TaskManager>) -> Router {
    let routes = Router::new()
        .route("/health", get(handle_health))
        .route("/execute", post(handle_execute))
        .route("/status/:task_id", get(handle_status))
        .route("/tasks", get(handle_tasks))
        .route("/running", get(handle_running))
        .route("/completed", get(handle_completed))
        .route("/content/:task_id", get(handle_content))
        .route("/delete/:task_id", delete(handle_delete))
        .route("/create-pr/:task_id", post(handle_create_pr))
        .with_state(manager);
    with_middleware(routes)
}

/// Panic boundary, request tracing and CORS shared by every route.
pub fn with_middleware(routes: Router) -> Router {
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
