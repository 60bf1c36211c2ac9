use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use supportbot_core::Config;
use supportbot_server::{router, AppState};

#[derive(Parser)]
#[command(name = "supportbot-server", version)]
#[command(about = "Relay that streams support-bot replies from an LLM completion API")]
struct Cli {
    /// Config file (defaults to <config dir>/supportbot/config.json)
    #[arg(long, env = "SUPPORTBOT_CONFIG")]
    config: Option<PathBuf>,
    /// Address to bind
    #[arg(long, env = "SUPPORTBOT_HOST")]
    host: Option<String>,
    /// Port to listen on
    #[arg(short, long, env = "SUPPORTBOT_PORT")]
    port: Option<u16>,
    /// Completion provider: openai or ollama
    #[arg(long, env = "SUPPORTBOT_PROVIDER")]
    provider: Option<String>,
    /// Model identifier sent upstream
    #[arg(short, long, env = "SUPPORTBOT_MODEL")]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,supportbot_server=debug,supportbot_core=debug".into()),
        )
        .with_target(false)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(host) = cli.host {
        config.bind_address = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(provider) = cli.provider {
        config.provider = Some(provider);
    }
    if let Some(model) = cli.model {
        config.model = Some(model);
    }

    let state = AppState::from_config(&config)?;
    tracing::info!(provider = state.provider_name(), model = state.model(), "completion backend ready");

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Support chat relay listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
