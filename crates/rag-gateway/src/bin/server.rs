//! Gateway server binary
//!
//! Run with: cargo run -p rag-gateway --bin rag-gateway-server -- --config gateway.toml

use clap::Parser;
use rag_gateway::{config::GatewayConfig, server::GatewayServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rag-gateway-server")]
#[command(version)]
#[command(about = "Accepts documents for processing and tracks job status")]
struct Args {
    /// Path to a TOML config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Host to bind (overrides config and GATEWAY_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config and GATEWAY_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rag_gateway=info,tower_http=debug".into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration: file, then environment, then flags
    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    config.apply_env()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Status store: {:?} (ttl {}s)", config.status_store.backend, config.status_store.ttl_secs);
    tracing::info!("  - Job queue: {:?} (topic {})", config.job_queue.backend, config.job_queue.topic);
    tracing::info!("  - Upload dir: {}", config.storage.upload_dir.display());

    let server = GatewayServer::new(config).await?;

    tracing::info!("Endpoints:");
    tracing::info!("  POST http://{}/upload          - Submit a document", server.address());
    tracing::info!("  GET  http://{}/status/:job_id  - Poll job status", server.address());

    server.start().await?;

    Ok(())
}
