use anyhow::Result;
use clap::Parser;
use parley_data::{DataNodeConfig, PollConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley-data")]
#[command(about = "Parley data node: durable replica and 2PC participant")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:8301")]
    ops_bind: SocketAddr,

    #[arg(long, default_value = "0.0.0.0:8302")]
    participant_bind: SocketAddr,

    #[arg(long, env = "PARLEY_COORDINATOR_URL", default_value = "http://127.0.0.1:7000")]
    coordinator_url: String,

    /// Directory under which this node's files_<id>/ tree lives.
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    #[arg(long, default_value = "0")]
    node_id: String,

    /// Hostname other processes should use to reach this node.
    #[arg(long, default_value = "127.0.0.1")]
    advertise_host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = DataNodeConfig {
        ops_bind: args.ops_bind,
        participant_bind: args.participant_bind,
        coordinator_url: args.coordinator_url,
        data_dir: args.data_dir,
        node_id: args.node_id,
        advertise_host: args.advertise_host,
        poll: PollConfig::default(),
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        ops_bind = %config.ops_bind,
        participant_bind = %config.participant_bind,
        coordinator = %config.coordinator_url,
        store_root = %config.store_root().display(),
        "starting data node"
    );

    let handle = parley_data::spawn(config).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    handle.cancel.cancel();
    Ok(())
}
