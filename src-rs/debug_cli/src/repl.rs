use std::io;

use crate::client::HTTPClient;
use crate::models::{CLIConfig, ExecuteRequest, PullRequestBody};
use crate::render;

pub struct REPL {
    pub config: CLIConfig,
    pub client: HTTPClient,
}

impl REPL {
    pub fn new(config: CLIConfig, client: HTTPClient) -> Self {
        Self { config, client }
    }

    pub fn run(&mut self) {
        render::banner(&self.config);
        loop {
            render::prompt();
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('/') {
                if self.handle_command(&line) {
                    break;
                }
                continue;
            }
            self.submit(&line);
        }
    }

    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("").trim_start_matches('/');
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "exit" | "quit" => return true,
            "help" => render::help(),
            "submit" => {
                if rest.is_empty() {
                    render::error("usage: /submit <task>");
                } else {
                    self.submit(rest);
                }
            }
            "repo" => match rest {
                "" => render::info(&format!("repository: {:?}", self.config.repository)),
                "none" => {
                    self.config.repository = None;
                    render::info("repository cleared");
                }
                repo => {
                    self.config.repository = Some(repo.to_string());
                    render::info("repository updated");
                }
            },
            "status" => {
                if let Some(id) = require_id(rest) {
                    match self.client.status(id) {
                        Ok(task) => render::task(&task),
                        Err(err) => render::error(&err),
                    }
                }
            }
            "tasks" => self.list("/tasks", "tasks"),
            "running" => self.list("/running", "running_tasks"),
            "completed" => self.list("/completed", "completed_tasks"),
            "content" => {
                if let Some(id) = require_id(rest) {
                    match self.client.content(id) {
                        Ok(content) => render::content(&content),
                        Err(err) => render::error(&err),
                    }
                }
            }
            "delete" => {
                if let Some(id) = require_id(rest) {
                    match self.client.delete(id) {
                        Ok(message) => render::info(&message),
                        Err(err) => render::error(&err),
                    }
                }
            }
            "pr" => self.pull_request(rest),
            "config" => render::config(&self.config),
            "base" => {
                if rest.is_empty() {
                    render::info(&format!("base: {}", self.config.base_url));
                } else {
                    self.config.base_url = rest.to_string();
                    self.client = HTTPClient::new(&self.config.base_url);
                    render::info("base url updated");
                }
            }
            "token" => {
                if rest.is_empty() {
                    render::error("usage: /token <token>");
                } else {
                    self.config.token = Some(rest.to_string());
                    render::info("token updated");
                }
            }
            _ => render::info("unknown command, type /help"),
        }
        false
    }

    fn submit(&self, task: &str) {
        let req = ExecuteRequest {
            task: task.to_string(),
            repository: self.config.repository.clone(),
        };
        match self.client.execute(&req) {
            Ok(resp) => render::info(&format!("{}: {}", resp.message, resp.task_id)),
            Err(err) => render::error(&err),
        }
    }

    fn list(&self, path: &str, key: &str) {
        match self.client.list(path, key) {
            Ok(tasks) => render::tasks(&tasks),
            Err(err) => render::error(&err),
        }
    }

    fn pull_request(&self, rest: &str) {
        let mut parts = rest.splitn(2, ' ');
        let id = match require_id(parts.next().unwrap_or("")) {
            Some(id) => id,
            None => return,
        };
        let token = match &self.config.token {
            Some(token) => token.clone(),
            None => {
                render::error("no GitHub token, set one with /token");
                return;
            }
        };
        let body = PullRequestBody {
            github_token: token,
            pr_title: parts
                .next()
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .map(str::to_string),
        };
        match self.client.create_pr(id, &body) {
            Ok(resp) => render::pull_request(&resp),
            Err(err) => render::error(&err),
        }
    }
}

fn require_id(rest: &str) -> Option<&str> {
    let id = rest.trim();
    if id.is_empty() {
        render::error("missing task id");
        None
    } else {
        Some(id)
    }
}
