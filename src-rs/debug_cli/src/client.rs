use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::models::{
    ContentResponse, ExecuteRequest, ExecuteResponse, PullRequestBody, PullRequestResponse,
    TaskDetail, TaskInfo,
};

pub struct HTTPClient {
    pub base_url: String,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn execute(&self, req: &ExecuteRequest) -> Result<ExecuteResponse, String> {
        let resp = self
            .client
            .post(self.url("/execute"))
            .json(req)
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }

    pub fn status(&self, task_id: &str) -> Result<TaskDetail, String> {
        self.get(&format!("/status/{}", task_id))
    }

    /// Lists one of `/tasks`, `/running` or `/completed`; `key` names the array.
    pub fn list(&self, path: &str, key: &str) -> Result<Vec<TaskInfo>, String> {
        let value: serde_json::Value = self.get(path)?;
        let items = value
            .get(key)
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        let mut out = Vec::new();
        for item in items {
            if let Ok(task) = serde_json::from_value::<TaskInfo>(item) {
                out.push(task);
            }
        }
        Ok(out)
    }

    pub fn content(&self, task_id: &str) -> Result<ContentResponse, String> {
        self.get(&format!("/content/{}", task_id))
    }

    pub fn delete(&self, task_id: &str) -> Result<String, String> {
        let resp = self
            .client
            .delete(self.url(&format!("/delete/{}", task_id)))
            .send()
            .map_err(|err| err.to_string())?;
        let value: serde_json::Value = decode(resp)?;
        Ok(value
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("deleted")
            .to_string())
    }

    /// The server answers failed publishes with 400 and a JSON body, so both
    /// outcomes decode into the same shape.
    pub fn create_pr(&self, task_id: &str, body: &PullRequestBody) -> Result<PullRequestResponse, String> {
        let resp = self
            .client
            .post(self.url(&format!("/create-pr/{}", task_id)))
            .json(body)
            .send()
            .map_err(|err| err.to_string())?;
        let status = resp.status();
        let text = resp.text().map_err(|err| err.to_string())?;
        serde_json::from_str::<PullRequestResponse>(&text)
            .map_err(|_| format!("http {}: {}", status.as_u16(), text))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
    if resp.status().is_success() {
        resp.json::<T>().map_err(|err| err.to_string())
    } else {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        Err(format!("http {}: {}", status.as_u16(), body))
    }
}
