pub mod config;
pub mod error;
pub mod helpers;

#[path = "workspace/lib.rs"]
pub mod workspace;
#[path = "agent/lib.rs"]
pub mod agent;
#[path = "task/lib.rs"]
pub mod task;
#[path = "content/lib.rs"]
pub mod content;
#[path = "publish/lib.rs"]
pub mod publish;
#[path = "api/lib.rs"]
pub mod api;

pub use api::TaskServer;
pub use config::{PermissionMode, ServerConfig};
pub use task::{Task, TaskManager, TaskStatus};
