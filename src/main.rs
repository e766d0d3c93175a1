//! chat-relay - a thin bridge to an OpenAI-compatible chat-completions API
//!
//! Runs a small HTTP server that forwards frontend chat requests upstream
//! with a server-held credential and returns a simplified reply.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_relay::config::Config;
use chat_relay::relay::run_server;

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(about = "Relay chat requests to an OpenAI-compatible provider")]
#[command(version)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listen address
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!(config = %path.display(), "Loading configuration");
            Config::from_file(path)?
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(addr) = cli.listen {
        tracing::info!(listen = %addr, "Override listen address");
        config.server.listen = addr;
    }

    run_server(config).await
}
