use super::types::PublishError;

const HTTPS_PREFIX: &str = "https://github.com/";
const SSH_PREFIX: &str = "git@github.com:";
const SSH_URL_PREFIX: &str = "ssh://git@github.com/";

/// Owner and name of a GitHub repository, taken from a remote URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GithubRepo {
    pub owner: String,
    pub name: String,
    pub https: bool,
}

impl GithubRepo {
    pub fn from_remote_url(url: &str) -> Result<Self, PublishError> {
        let url = url.trim();
        if !url.contains("github.com") {
            return Err(PublishError::UnsupportedHost(url.to_string()));
        }

        let (path, https) = if let Some(rest) = url.strip_prefix(HTTPS_PREFIX) {
            (rest, true)
        } else if let Some(rest) = url.strip_prefix(SSH_PREFIX) {
            (rest, false)
        } else if let Some(rest) = url.strip_prefix(SSH_URL_PREFIX) {
            (rest, false)
        } else {
            return Err(PublishError::UnparseableRemote(url.to_string()));
        };

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        match path.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    https,
                })
            }
            _ => Err(PublishError::UnparseableRemote(url.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_and_ssh_remotes() {
        let https = GithubRepo::from_remote_url("https://github.com/octocat/Hello-World.git").unwrap();
        assert_eq!((https.owner.as_str(), https.name.as_str(), https.https), ("octocat", "Hello-World", true));

        let bare = GithubRepo::from_remote_url("https://github.com/octocat/Hello-World").unwrap();
        assert_eq!(bare.name, "Hello-World");

        let ssh = GithubRepo::from_remote_url("git@github.com:octocat/Hello-World.git").unwrap();
        assert_eq!((ssh.owner.as_str(), ssh.name.as_str(), ssh.https), ("octocat", "Hello-World", false));

        let ssh_url = GithubRepo::from_remote_url("ssh://git@github.com/octocat/dotgit.github.io.git").unwrap();
        assert_eq!(ssh_url.name, "dotgit.github.io");
    }

    #[test]
    fn other_hosts_are_unsupported() {
        assert!(matches!(
            GithubRepo::from_remote_url("https://gitlab.com/group/project.git"),
            Err(PublishError::UnsupportedHost(_))
        ));
    }

    #[test]
    fn odd_github_urls_are_unparseable() {
        for url in [
            "http://github.com/octocat/Hello-World",
            "https://github.com/octocat",
            "https://github.com/a/b/c",
        ] {
            assert!(
                matches!(GithubRepo::from_remote_url(url), Err(PublishError::UnparseableRemote(_))),
                "{}",
                url
            );
        }
    }
}
