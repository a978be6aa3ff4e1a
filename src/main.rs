use anyhow::{Context, Result};
use bookloom::{GraphManager, HttpServer, JsonFileStorage, MemoryStorage, ServerConfig};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bookloom", version, about = "Personal book graph server")]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0", env = "BOOKLOOM_HOST")]
    host: String,

    /// Port to bind the HTTP server to
    #[arg(long, default_value_t = 8000, env = "BOOKLOOM_PORT")]
    port: u16,

    /// Snapshot file holding the graph
    #[arg(long, default_value = "./data/graph.json", env = "BOOKLOOM_DATA_PATH")]
    data_path: PathBuf,

    /// Keep the graph in memory only
    #[arg(long, env = "BOOKLOOM_IN_MEMORY")]
    in_memory: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info", env = "BOOKLOOM_LOG_FILTER")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Bookloom v{}", bookloom::version());

    let manager = if cli.in_memory {
        info!("Using in-memory storage, the graph will not survive a restart");
        GraphManager::open(MemoryStorage::new())
    } else {
        let storage = JsonFileStorage::new(&cli.data_path)
            .with_context(|| format!("cannot prepare data path {}", cli.data_path.display()))?;
        GraphManager::open(storage)
    };

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
    };
    let server = HttpServer::new(Arc::new(manager), config.clone());
    server
        .start(shutdown_signal())
        .await
        .with_context(|| format!("HTTP server on {} failed", config.bind_address()))?;

    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
