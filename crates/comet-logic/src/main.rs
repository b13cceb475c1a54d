//! Logic server binary.
//!
//! # Usage
//!
//! ```bash
//! comet-logic --rpc-bind 0.0.0.0:7170 --heartbeat-secs 300
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use comet_logic::{JsonTokenAuthenticator, LogicConfig, MemoryRouteStore, SessionRpc};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Comet logic server
#[derive(Parser, Debug)]
#[command(name = "comet-logic")]
#[command(about = "Session authentication and routing for comet servers")]
#[command(version)]
struct Args {
    /// Address the session RPC listens on
    #[arg(long, default_value = "0.0.0.0:7170")]
    rpc_bind: String,

    /// Idle seconds granted to every client session
    #[arg(long, default_value = "300")]
    heartbeat_secs: u64,

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

    let config = LogicConfig {
        rpc_bind: args.rpc_bind,
        heartbeat: Duration::from_secs(args.heartbeat_secs),
    };

    let service = SessionRpc::new(JsonTokenAuthenticator::new(), MemoryRouteStore::new(), &config);

    let listener = TcpListener::bind(&config.rpc_bind).await?;
    tracing::info!("session rpc listening on {}", listener.local_addr()?);

    comet_rpc::serve(listener, Arc::new(service)).await;

    Ok(())
}
