//! Card policy API server: answers which actions a user's card may perform.

mod config;
mod problem;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::config::load_config;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "card-policy-api")]
#[command(about = "HTTP API for permitted card actions")]
struct Args {
    /// Config file (TOML). Defaults apply when the file is missing.
    #[arg(long, default_value = "card-policy.toml")]
    config: PathBuf,

    /// Address to bind the server to (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Policy table file (overrides config)
    #[arg(long)]
    policy_table: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("card_policy_api=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(policy_table) = args.policy_table {
        config.policy_table = Some(policy_table);
    }
    config.validate()?;
    info!(config = %args.config.display(), "starting card-policy-api");

    let state = AppState::from_config(&config).context("initialise policy service")?;
    let app = routes::app(state);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind, config.port))?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
