//! fileport Server Binary
//!
//! Serves a directory over TCP.

use clap::Parser;
use fileport::{Config, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// A frame length prefix is a u32
const MAX_FRAME_KB: u64 = (u32::MAX as u64 + 1) / 1024;

/// Keeps the byte count within a u64
const MAX_TRANSFER_MB: u64 = u64::MAX / (1024 * 1024);

/// fileport Server
#[derive(Parser, Debug)]
#[command(name = "fileport-server")]
#[command(about = "Serve a directory to LS/GET/PUT clients")]
#[command(version)]
struct Args {
    /// Directory to serve
    #[arg(short, long, default_value = "./server_files")]
    dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:5002")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Largest control message accepted, in KB (at most 4 GiB, the frame prefix limit)
    #[arg(long, default_value = "16384", value_parser = clap::value_parser!(u64).range(1..=MAX_FRAME_KB))]
    max_frame_kb: u64,

    /// Largest upload accepted, in MB
    #[arg(long, default_value = "4096", value_parser = clap::value_parser!(u64).range(1..=MAX_TRANSFER_MB))]
    max_transfer_mb: u64,

    /// Drop connections idle for this long (0 = never)
    #[arg(short, long, default_value = "0")]
    timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fileport=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("fileport server v{}", fileport::VERSION);

    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::new(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Set up Ctrl+C handler
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Server shutting down...");
        shutdown.shutdown();
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    let open = server.active_connections();
    if open > 0 {
        tracing::info!("Server stopped with {} connections still open", open);
    } else {
        tracing::info!("Server stopped");
    }
}

/// Map command line arguments onto the server config
fn build_config(args: &Args) -> fileport::Result<Config> {
    let max_frame_size = args
        .max_frame_kb
        .checked_mul(1024)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .ok_or_else(|| {
            fileport::FileportError::Config(format!(
                "--max-frame-kb {} does not fit in memory on this platform",
                args.max_frame_kb
            ))
        })?;
    let max_transfer_size = args.max_transfer_mb.checked_mul(1024 * 1024).ok_or_else(|| {
        fileport::FileportError::Config(format!(
            "--max-transfer-mb {} is too large",
            args.max_transfer_mb
        ))
    })?;

    Ok(Config::builder()
        .root_dir(&args.dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .max_frame_size(max_frame_size)
        .max_transfer_size(max_transfer_size)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build())
}
