//! Parts RPC Server - JSON-RPC backend for the parts catalog UI.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps the parts-core library
//! for the browser UI running on the same machine.

mod handlers;
mod server;
mod wrapper;

use anyhow::Result;
use clap::Parser;
use parts_core::config::{AppConfig, SearchDefaults, ServerConfig};
use parts_core::{FetchLimits, PartsApi};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "parts-rpc")]
#[command(about = "JSON-RPC server for the parts catalog")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value_t = ServerConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = ServerConfig::DEFAULT_HOST)]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Directory holding `data/parts.db` (created if missing)
    #[arg(long, default_value = ".")]
    data_root: PathBuf,

    /// Matches to collect per search or load-more call
    #[arg(long, default_value_t = SearchDefaults::TARGET_COUNT)]
    target_count: usize,

    /// Records requested per store round-trip
    #[arg(long, default_value_t = SearchDefaults::CHUNK_SIZE)]
    chunk_size: usize,

    /// Store round-trips allowed per call
    #[arg(long, default_value_t = SearchDefaults::MAX_CHUNKS_PER_CALL)]
    max_chunks: usize,

    /// Reject sorts and range filters on data fields without an index
    #[arg(long)]
    require_indexes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting {} RPC Server", AppConfig::APP_NAME);
    info!("Data root: {}", args.data_root.display());

    let limits = FetchLimits::new(args.target_count, args.chunk_size, args.max_chunks)?;
    let api = PartsApi::builder(&args.data_root)
        .auto_create_dirs(true)
        .fetch_limits(limits)
        .require_field_indexes(args.require_indexes)
        .build()
        .await?;

    let addr = server::start_server(api, &args.host, args.port).await?;

    // Print port for the UI launcher to read (intentional stdout)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
