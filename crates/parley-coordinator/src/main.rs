use anyhow::Result;
use clap::Parser;
use parley_coordinator::CoordinatorConfig;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley-coordinator")]
#[command(about = "Parley coordinator: rosters, 2PC, and chatroom placement")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:7000")]
    bind: SocketAddr,

    /// Port reported to registering nodes (defaults to the bound port).
    #[arg(long, default_value = "0")]
    public_port: u16,

    /// Liveness sweep period in seconds.
    #[arg(long, default_value = "60")]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = CoordinatorConfig {
        bind: args.bind,
        public_port: args.public_port,
        sweep_interval: std::time::Duration::from_secs(args.sweep_interval_secs),
        ..CoordinatorConfig::default()
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.bind,
        sweep_interval = ?config.sweep_interval,
        "starting coordinator"
    );

    let handle = parley_coordinator::spawn(config).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    handle.cancel.cancel();
    Ok(())
}
