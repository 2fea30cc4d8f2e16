//! Collbank RPC Server - JSON-RPC front end for the collection catalogue.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps the collbank-core
//! library: viewing and exporting collections, repairing and publishing
//! VLO records, and registering their handles.

mod handlers;
mod server;
mod wrapper;

use anyhow::{Context, Result};
use clap::Parser;
use collbank_core::config::PathsConfig;
use collbank_core::{CollbankApi, EpicPidService, PublishConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "collbank-rpc")]
#[command(about = "JSON-RPC server for the collbank catalogue")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Directory holding the catalogue database
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for plain registry copies (default: <data-dir>/registry)
    #[arg(long)]
    registry_dir: Option<PathBuf>,

    /// Directory for the .cmdi.xml harvester feed (default: <data-dir>/publish)
    #[arg(long)]
    publish_dir: Option<PathBuf>,

    /// Public base URL of the registry directory
    #[arg(long, default_value = PathsConfig::DEFAULT_REGISTRY_URL)]
    registry_url: String,

    /// Handle collection URL of the ePIC service
    #[arg(long, env = "COLLBANK_PID_URL")]
    pid_url: Option<String>,

    /// ePIC user name
    #[arg(long, env = "COLLBANK_PID_USER")]
    pid_user: Option<String>,

    /// ePIC password
    #[arg(long, env = "COLLBANK_PID_PASSWORD", hide_env_values = true)]
    pid_password: Option<String>,

    /// Prefix for newly minted handles
    #[arg(long)]
    pid_prefix: Option<String>,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(PathsConfig::DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(PathsConfig::DATA_DIR_NAME))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; RUST_LOG overrides the level chosen by --debug
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase())),
        )
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Collbank RPC Server");

    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);
    info!("Data directory: {}", data_dir.display());

    let publish = PublishConfig::new(
        args.registry_dir
            .unwrap_or_else(|| data_dir.join(PathsConfig::REGISTRY_DIR_NAME)),
        args.publish_dir
            .unwrap_or_else(|| data_dir.join(PathsConfig::PUBLISH_DIR_NAME)),
        args.registry_url,
    );

    let mut builder = CollbankApi::builder(&data_dir).publish_config(publish);
    match (args.pid_url, args.pid_user, args.pid_password) {
        (Some(url), Some(user), Some(password)) => {
            let service = EpicPidService::new(url, user, password, args.pid_prefix)
                .context("Failed to set up the PID service")?;
            builder = builder.pid_service(Arc::new(service));
        }
        (Some(_), _, _) => warn!("--pid-url given without credentials; PID registration disabled"),
        _ => {}
    }

    let api = builder.build().context("Failed to open the catalogue")?;

    // Start the server
    let addr = server::start_server(api, &args.host, args.port).await?;

    // Machine-readable port line for process supervisors
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
