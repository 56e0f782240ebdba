pub mod error;
pub mod git;
pub mod provisioner;
pub mod repository;

pub use error::WorkspaceError;
pub use git::{Git, GitError};
pub use provisioner::WorkspaceProvisioner;
pub use repository::RepositoryRef;
