use std::fmt;
use std::str::FromStr;

use super::error::WorkspaceError;

const GITHUB_BASE: &str = "https://github.com";

/// A validated reference to a repository that can be cloned into a workspace.
///
/// Accepts `owner/name` shorthand, expanded to the GitHub HTTPS clone URL,
/// or an explicit `https://` URL used as is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositoryRef {
    raw: String,
    clone_url: String,
}

impl RepositoryRef {
    pub fn parse(raw: &str) -> Result<Self, WorkspaceError> {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix("https://") {
            if rest.is_empty() || rest.starts_with('/') || rest.contains(char::is_whitespace) {
                return Err(WorkspaceError::InvalidRepository(raw.to_string()));
            }
            return Ok(Self {
                raw: trimmed.to_string(),
                clone_url: trimmed.to_string(),
            });
        }

        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| WorkspaceError::InvalidRepository(raw.to_string()))?;
        if !is_valid_segment(owner) || !is_valid_segment(name) {
            return Err(WorkspaceError::InvalidRepository(raw.to_string()));
        }
        let name = name.strip_suffix(".git").unwrap_or(name);
        Ok(Self {
            raw: trimmed.to_string(),
            clone_url: format!("{}/{}/{}.git", GITHUB_BASE, owner, name),
        })
    }

    pub fn clone_url(&self) -> &str {
        &self.clone_url
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for RepositoryRef {
    type Err = WorkspaceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
