use anyhow::Context;
use clap::Parser;
use onething_ai_adapters::{AnthropicClient, AnthropicConfig};
use onething_core::{AppConfig, TaskStore};
use onething_server::logging::init_logging;
use onething_server::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "onething-server", version, about = "OneThing briefing relay and task API")]
struct Args {
    /// Config file (defaults to ONETHING_CONFIG or the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configured one
    #[arg(long)]
    bind: Option<String>,

    /// Keep tasks in memory only
    #[arg(long)]
    in_memory: bool,

    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut config = match &args.config {
        Some(path) => {
            let mut config = AppConfig::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => AppConfig::load()?,
    };
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    let store = if args.in_memory {
        TaskStore::in_memory()
    } else {
        match config
            .storage
            .data_file
            .clone()
            .or_else(AppConfig::default_data_file)
        {
            Some(path) => TaskStore::open(path).await?,
            None => TaskStore::in_memory(),
        }
    };
    match store.data_file() {
        Some(path) => tracing::info!("Task store: path={}", path.display()),
        None => tracing::info!("Task store: in memory"),
    }

    let client = AnthropicClient::new(AnthropicConfig {
        base_url: config.ai.base_url.clone(),
        api_key: config.ai.api_key.clone(),
        model: config.ai.model.clone(),
        max_tokens: config.ai.max_tokens,
        anthropic_version: config.ai.anthropic_version.clone(),
        idle_timeout: Duration::from_secs(config.ai.idle_timeout_secs),
    })?;

    let app = build_router(AppState::new(Arc::new(client), Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr.as_str())
        .await
        .with_context(|| format!("bind server listener failed: {}", config.server.bind_addr))?;
    tracing::info!(
        "{} v{} listening on http://{}",
        onething_core::CORE_NAME,
        onething_core::VERSION,
        config.server.bind_addr
    );
    axum::serve(listener, app)
        .await
        .context("server terminated with error")
}
