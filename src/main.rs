use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use repofix::{logging, routes, Config, FixerService};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Directory for generated artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    logging::init(&config.log_level)?;
    config.ensure_directories_exist().await?;

    if config.api_keys.completion_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; completion requests will fail");
    }

    let addr = config.bind_addr()?;
    info!("Output directory: {}", config.output_dir.display());
    info!("Working directory: {}", config.work_dir.display());

    let service = Arc::new(FixerService::from_config(config)?);
    let app = routes::create_app(service);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server is running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
