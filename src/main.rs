//! bip-extract server binary

use bip_extract::{Config, Error, serve_with_shutdown};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serve the BI Publisher extractor over HTTP
#[derive(Debug, Parser)]
#[command(name = "bip-extract", version, about)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(long, env = "BIP_EXTRACT_PORT")]
    port: Option<u16>,

    /// Address to bind to (overrides the config file)
    #[arg(long, env = "BIP_EXTRACT_ADDRESS")]
    address: Option<IpAddr>,

    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bip_extract=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    tracing::info!(
        address = %config.api.bind_address,
        layout = ?config.extraction.sql_layout,
        templates = ?config.extraction.template_extensions,
        "Starting BI Publisher extractor"
    );

    serve_with_shutdown(Arc::new(config)).await?;
    Ok(())
}

fn load_config(args: &Args) -> Result<Config, Error> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let current = config.api.bind_address;
    config.api.bind_address = SocketAddr::new(
        args.address.unwrap_or(current.ip()),
        args.port.unwrap_or(current.port()),
    );

    Ok(config)
}
