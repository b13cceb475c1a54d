//! Comet server binary.
//!
//! # Usage
//!
//! ```bash
//! comet-server --server-id 1 --client-bind 0.0.0.0:8080 --rpc-bind 0.0.0.0:8092 \
//!     --logic-addr 127.0.0.1:7170
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use comet_rpc::SessionClient;
use comet_server::{
    CometConfig, ControlRpc, Server, ServerError, Stats, StatsSink, serve_clients,
};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Comet edge server
#[derive(Parser, Debug)]
#[command(name = "comet-server")]
#[command(about = "Comet push server holding client connections")]
#[command(version)]
struct Args {
    /// Server identity reported to the logic tier
    #[arg(long, default_value = "1")]
    server_id: i32,

    /// Address clients connect to
    #[arg(long, default_value = "0.0.0.0:8080")]
    client_bind: String,

    /// Address the control RPC listens on
    #[arg(long, default_value = "0.0.0.0:8092")]
    rpc_bind: String,

    /// Logic tier session RPC address
    #[arg(long, default_value = "127.0.0.1:7170")]
    logic_addr: String,

    /// Seconds between liveness pings to the logic tier
    #[arg(long, default_value = "10")]
    logic_ping_secs: u64,

    /// Registry shard count
    #[arg(long, default_value = "32")]
    buckets: usize,

    /// Outbound packets queued per connection
    #[arg(long, default_value = "64")]
    channel_capacity: usize,

    /// Seconds a new connection has to authenticate
    #[arg(long, default_value = "5")]
    handshake_timeout_secs: u64,

    /// Seconds between statistics log lines
    #[arg(long, default_value = "60")]
    stats_interval_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config(&self) -> Result<CometConfig, ServerError> {
        if self.buckets == 0 {
            return Err(ServerError::Config("bucket count must be positive".to_string()));
        }

        Ok(CometConfig {
            server_id: self.server_id,
            bucket_count: self.buckets,
            channel_capacity: self.channel_capacity,
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            client_bind: self.client_bind.clone(),
            rpc_bind: self.rpc_bind.clone(),
            logic_addr: self.logic_addr.clone(),
            logic_ping_interval: Duration::from_secs(self.logic_ping_secs.max(1)),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = args.config()?;
    tracing::info!(server_id = config.server_id, buckets = config.bucket_count, "comet starting");

    let logic = Arc::new(SessionClient::dial(&config.logic_addr).await?);
    logic.ping().await?;
    tracing::info!("connected to logic tier at {}", config.logic_addr);
    tokio::spawn(ping_logic(Arc::clone(&logic), config.logic_ping_interval));

    let stats = Arc::new(Stats::new());
    let server =
        Arc::new(Server::new(config.bucket_count, Arc::clone(&stats) as Arc<dyn StatsSink>));
    tokio::spawn(report_stats(stats, Arc::clone(&server), args.stats_interval_secs));

    let rpc_listener = TcpListener::bind(&config.rpc_bind).await?;
    tracing::info!("control rpc listening on {}", rpc_listener.local_addr()?);
    tokio::spawn(comet_rpc::serve(rpc_listener, Arc::new(ControlRpc::new(Arc::clone(&server)))));

    let client_listener = TcpListener::bind(&config.client_bind).await?;
    tracing::info!("clients listening on {}", client_listener.local_addr()?);
    serve_clients(client_listener, server, logic, config.session()).await;

    Ok(())
}

/// Ping the logic tier forever. A failed ping drops the connection, so the
/// next ping (or client connect) redials it.
async fn ping_logic(logic: Arc<SessionClient>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;

    let mut healthy = true;
    loop {
        interval.tick().await;
        match logic.ping().await {
            Ok(()) if !healthy => {
                tracing::info!("logic tier reachable again");
                healthy = true;
            },
            Ok(()) => {},
            Err(error) => {
                tracing::warn!(%error, "logic tier ping failed");
                healthy = false;
            },
        }
    }
}

async fn report_stats(stats: Arc<Stats>, server: Arc<Server>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.tick().await;

    loop {
        interval.tick().await;
        let snapshot = stats.snapshot();
        tracing::info!(
            connections = server.connection_count(),
            rooms = server.rooms().len(),
            push = snapshot.push,
            broadcast = snapshot.broadcast,
            room_broadcast = snapshot.room_broadcast,
            "stats"
        );
    }
}
