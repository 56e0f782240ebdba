pub mod manager;
pub mod store;
pub mod types;

pub use manager::{ExecutionError, TaskManager};
pub use store::{PublishGuard, PublishSlot, TaskStore};
pub use types::{Task, TaskStatus, TaskSummary};
