use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use task_server_rs::api::TaskServer;
use task_server_rs::config::{PermissionMode, ServerConfig};
use task_server_rs::helpers::{build_manager, load_config_from_env};

#[derive(Parser)]
#[command(name = "task-server")]
#[command(about = "Runs coding-agent tasks in isolated workspaces behind a REST API")]
struct Args {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Directory under which task workspaces are created
    #[arg(long)]
    workspace_root: Option<PathBuf>,

    /// Agent executable
    #[arg(long)]
    agent_binary: Option<String>,

    /// Permission mode passed to the agent
    #[arg(long)]
    permission_mode: Option<PermissionMode>,

    /// Base URL of the GitHub REST API
    #[arg(long)]
    github_api_url: Option<String>,

    /// Directory for the daily rolling log file
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply(self, mut cfg: ServerConfig) -> ServerConfig {
        if let Some(host) = self.host {
            cfg.host = host;
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(root) = self.workspace_root {
            cfg.workspace_root = root;
        }
        if let Some(binary) = self.agent_binary {
            cfg.agent_binary = binary;
        }
        if let Some(mode) = self.permission_mode {
            cfg.permission_mode = mode;
        }
        if let Some(url) = self.github_api_url {
            cfg.github_api_url = url;
        }
        if let Some(dir) = self.log_dir {
            cfg.log_dir = Some(dir);
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = args.log_level.clone();
    let config = args.apply(load_config_from_env(ServerConfig::default())?);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    let console = tracing_subscriber::fmt::layer().with_filter(env_filter.clone());

    // Keeps the file writer flushing until main returns.
    let _guard = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "task-server.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_filter(env_filter),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(console).init();
            None
        }
    };

    info!("Coding task execution server starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Workspace root: {}", config.workspace_root.display());
    info!("Agent: {} ({})", config.agent_binary, config.permission_mode);

    let manager = build_manager(&config)?;
    TaskServer::new(config, manager).start().await
}
