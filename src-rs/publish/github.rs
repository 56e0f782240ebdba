use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

const USER_AGENT: &str = concat!("task-server/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreatedPullRequest {
    pub html_url: String,
    pub number: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("GitHub API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    #[error("request to GitHub failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl GithubError {
    /// True when GitHub refused the `base` ref of a pull request.
    pub fn is_base_rejection(&self) -> bool {
        match self {
            GithubError::Api { status, body, .. } => {
                *status == StatusCode::UNPROCESSABLE_ENTITY.as_u16() && body.contains("base")
            }
            GithubError::Http(_) => false,
        }
    }
}

/// Minimal client for the GitHub REST endpoints used when publishing.
#[derive(Clone, Debug)]
pub struct GithubClient {
    base_url: String,
    client: Client,
}

impl GithubClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let base_url = if base_url.is_empty() {
            "https://api.github.com"
        } else {
            base_url
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        request: &NewPullRequest,
    ) -> Result<CreatedPullRequest, GithubError> {
        let endpoint = format!("{}/repos/{}/{}/pulls", self.base_url, owner, repo);
        info!("Creating PR via GitHub API: {} (base {})", endpoint, request.base);

        let resp = self
            .client
            .post(&endpoint)
            .header(AUTHORIZATION, format!("token {}", token))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::CREATED {
            return Ok(resp.json::<CreatedPullRequest>().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        error!("GitHub API error: {} - {}", status.as_u16(), body);
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| value.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| "Unknown error".to_string());
        Err(GithubError::Api {
            status: status.as_u16(),
            message,
            body,
        })
    }
}
