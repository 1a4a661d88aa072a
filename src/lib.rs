// src/lib.rs
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod notify;
pub mod registry;
pub mod router;
pub mod storage;
pub mod stores;
pub mod transport;

use clap::Parser;

pub use context::AppContext;
pub use dispatcher::{Dispatcher, Operation, SessionSource, Transport};
pub use error::{AppError, AppResult};
pub use models::{Envelope, KnowledgeItem, PageStatus, UserInfo};
pub use registry::{EndpointKey, EndpointSpec, Method};

/// 初始化日志：`RUST_LOG` 优先，其次是配置中的级别
fn init_tracing(level: &str) {
    let level = level.trim();
    let default_level = if level.is_empty() {
        "info".to_string()
    } else {
        level.to_lowercase()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// --- 应用程序入口 ---

pub fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli::resolve_config(&cli)?;
    init_tracing(&config.log_level);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let ctx = AppContext::from_config(config)?;
        cli::execute(&ctx, cli.command).await
    })
}
