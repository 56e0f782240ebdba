use std::io::{self, Write};

use serde_json::Value;

use crate::models::{CLIConfig, ContentResponse, PullRequestResponse, TaskDetail, TaskInfo};

pub fn banner(cfg: &CLIConfig) {
    println!("Task Server Debug CLI");
    println!("API: {}", cfg.base_url);
    if let Some(repo) = &cfg.repository {
        println!("Repository: {}", repo);
    }
    println!("Type /help for commands. Plain text is submitted as a task.");
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  /help                  Show commands");
    println!("  /exit | /quit          Exit");
    println!("  /submit <task>         Submit a task");
    println!("  /repo [ref|none]       Set repository for later submissions");
    println!("  /status <id>           Show a task");
    println!("  /tasks                 List all tasks");
    println!("  /running               List running tasks");
    println!("  /completed             List finished tasks");
    println!("  /content <id>          Show diff or files of a task");
    println!("  /delete <id>           Delete a task");
    println!("  /pr <id> [title]       Open a pull request");
    println!("  /token <token>         Set GitHub token");
    println!("  /base <url>            Update base URL");
    println!("  /config                Show current config");
}

pub fn tasks(tasks: &[TaskInfo]) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for task in tasks {
        let code = task
            .return_code
            .map(|code| format!(" rc={}", code))
            .unwrap_or_default();
        let end = task.end_time.as_deref().unwrap_or("-");
        println!(
            "[{}{}] {} {} .. {} - {}",
            task.status, code, task.id, task.start_time, end, task.task
        );
    }
}

pub fn task(task: &TaskDetail) {
    println!("id: {}", task.id);
    println!("task: {}", task.task);
    println!("status: {}", task.status);
    println!("started: {}", task.start_time);
    if let Some(end) = &task.end_time {
        println!("finished: {}", end);
    }
    if let Some(code) = task.return_code {
        println!("return code: {}", code);
    }
    if let Some(dir) = &task.temp_dir {
        println!("workspace: {}", dir);
    }
    if let Some(err) = &task.error {
        println!("error: {}", err);
    }
    if let Some(output) = &task.output {
        events(output);
    }
}

fn events(output: &str) {
    match serde_json::from_str::<Vec<Value>>(output) {
        Ok(events) => {
            for event in events {
                let kind = event.get("type").and_then(Value::as_str).unwrap_or("?");
                let content = event.get("content").and_then(Value::as_str).unwrap_or("");
                println!("{}> {}", kind, content);
            }
        }
        Err(_) => println!("output: {}", output),
    }
}

pub fn content(resp: &ContentResponse) {
    println!("task: {}  git: {}  type: {}", resp.task_id, resp.is_git_repo, resp.content_type);
    match &resp.content {
        Value::Null => println!("no changes"),
        Value::String(diff) => println!("{}", diff),
        Value::Array(files) => {
            for file in files {
                let path = file.get("path").and_then(Value::as_str).unwrap_or("?");
                let kind = file.get("type").and_then(Value::as_str).unwrap_or("?");
                let size = file.get("size").and_then(Value::as_u64).unwrap_or(0);
                println!("  {} ({}, {} bytes)", path, kind, size);
            }
        }
        other => println!("{}", other),
    }
}

pub fn pull_request(resp: &PullRequestResponse) {
    if !resp.success {
        error(resp.error.as_deref().unwrap_or("pull request failed"));
        return;
    }
    println!(
        "PR #{} on {}: {}",
        resp.pr_number.unwrap_or_default(),
        resp.branch_name.clone().unwrap_or_default(),
        resp.pr_url.clone().unwrap_or_default()
    );
}

pub fn config(cfg: &CLIConfig) {
    println!("config:");
    println!("  base: {}", cfg.base_url);
    println!("  repository: {}", cfg.repository.clone().unwrap_or_else(|| "none".to_string()));
    println!("  token: {}", if cfg.token.is_some() { "set" } else { "unset" });
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}
