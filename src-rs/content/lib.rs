pub mod resolver;
pub mod types;

pub use resolver::{untracked_file_diff, ContentResolver};
pub use types::{TaskContent, WorkspaceFile};
