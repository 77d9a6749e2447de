//! vaultkv Server Binary
//!
//! Starts the TCP server for vaultkv.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use vaultkv::network::Server;
use vaultkv::{Config, Store};

/// vaultkv Server
#[derive(Parser, Debug)]
#[command(name = "vaultkv-server")]
#[command(about = "Persistent, authenticated, multi-user key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./vaultkv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:9999")]
    listen: String,

    /// Quota window in seconds (0 disables quotas)
    #[arg(long, default_value = "60")]
    quota_window: u64,

    /// Upload quota in bytes per window
    #[arg(long, default_value = "1048576")]
    quota_up: u64,

    /// Download quota in bytes per window
    #[arg(long, default_value = "1048576")]
    quota_down: u64,

    /// Request quota per window
    #[arg(long, default_value = "1024")]
    quota_req: u64,

    /// Maximum number of keys in a top-keys listing
    #[arg(long, default_value = "4")]
    top_len: usize,

    /// Admin username allowed to register extensions (repeatable)
    #[arg(long = "admin")]
    admins: Vec<String>,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vaultkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("vaultkv server v{}", vaultkv::VERSION);
    tracing::info!("data directory: {}", args.data_dir);
    tracing::info!("listen address: {}", args.listen);

    let mut builder = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .quota_window(Duration::from_secs(args.quota_window))
        .quota_up(args.quota_up)
        .quota_down(args.quota_down)
        .quota_req(args.quota_req)
        .top_len(args.top_len)
        .max_connections(args.max_connections);
    for admin in &args.admins {
        builder = builder.admin(admin);
    }
    let config = builder.build();

    let store = match Store::open(config.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let server = Server::new(config, store);
    if let Err(e) = server.run() {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}
