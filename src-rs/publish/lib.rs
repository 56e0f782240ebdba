pub mod github;
pub mod publisher;
pub mod remote;
pub mod types;

pub use github::{GithubClient, GithubError, NewPullRequest};
pub use publisher::{branch_name, commit_message, Publisher};
pub use remote::GithubRepo;
pub use types::{PublishError, PullRequestCreated, PullRequestRequest};
