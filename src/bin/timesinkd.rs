//! timesinkd - Timesink daemon.
//!
//! Serves review analysis, pagination, export and store search over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use timesink::server::config::Config;

/// Timesink daemon - review analysis service.
#[derive(Parser)]
#[command(name = "timesinkd")]
#[command(version = timesink::PKG_VERSION)]
#[command(about = "Timesink review analysis daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "TIMESINK_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Override the bind address from the config file.
    #[arg(short, long, env = "TIMESINK_ADDRESS")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    let service = config.service_builder().build()?;

    // Parse address
    let address = args.address.unwrap_or_else(|| config.server.address.clone());
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| timesink::TimesinkError::Configuration(format!("Invalid address: {e}")))?;

    info!(version = timesink::PKG_VERSION, %addr, "timesinkd starting");

    let app = timesink::server::router(Arc::new(service));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
