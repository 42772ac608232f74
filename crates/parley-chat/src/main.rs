use anyhow::Result;
use clap::Parser;
use parley_chat::ChatNodeConfig;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley-chat")]
#[command(about = "Parley chat node: live chatrooms and subscriber streams")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:8201")]
    rpc_bind: SocketAddr,

    #[arg(long, default_value = "0.0.0.0:8202")]
    stream_bind: SocketAddr,

    #[arg(long, env = "PARLEY_COORDINATOR_URL", default_value = "http://127.0.0.1:7000")]
    coordinator_url: String,

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
    let config = ChatNodeConfig {
        rpc_bind: args.rpc_bind,
        stream_bind: args.stream_bind,
        coordinator_url: args.coordinator_url,
        advertise_host: args.advertise_host,
        ..ChatNodeConfig::default()
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_bind = %config.rpc_bind,
        stream_bind = %config.stream_bind,
        coordinator = %config.coordinator_url,
        "starting chat node"
    );

    let handle = parley_chat::spawn(config).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    handle.cancel.cancel();
    Ok(())
}
