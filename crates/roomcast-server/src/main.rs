//! Roomcast server binary.
//!
//! # Usage
//!
//! ```bash
//! # Development defaults
//! roomcast-server --bind 127.0.0.1:8787 --log-level debug
//!
//! # Production
//! roomcast-server --bind 0.0.0.0:8787 --hibernate-after-secs 300
//! ```

use std::time::Duration;

use clap::Parser;
use roomcast_server::{RuntimeConfig, Server};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Roomcast relay server
#[derive(Parser, Debug)]
#[command(name = "roomcast-server")]
#[command(about = "Room-scoped WebSocket broadcast relay")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8787")]
    bind: String,

    /// Seconds a room instance may sit idle before hibernating
    #[arg(long, default_value = "60")]
    hibernate_after_secs: u64,

    /// Per-connection outbound queue capacity
    #[arg(long, default_value = "256")]
    send_queue: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("roomcast server starting");

    let config = RuntimeConfig {
        bind_address: args.bind,
        hibernate_after: Duration::from_secs(args.hibernate_after_secs),
        send_queue: args.send_queue,
    };

    let server = Server::bind(config).await?;
    server.run().await?;

    Ok(())
}
