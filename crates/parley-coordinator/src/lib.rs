//! Parley coordinator: the single point of authority that registers data
//! and chat nodes, drives two-phase commit across the data replicas,
//! places chatrooms on chat nodes, and recovers rooms whose host died.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod placement;
pub mod roster;
pub mod routes;
pub mod rpc;
pub mod state;
pub mod sweep;
pub mod twopc;

pub use config::CoordinatorConfig;
pub use errors::{CoordinatorError, PlacementError};
pub use state::{AppState, CoordinatorState};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Running coordinator: bound address, shared state, shutdown token.
pub struct CoordinatorHandle {
    pub addr: SocketAddr,
    pub state: AppState,
    pub cancel: CancellationToken,
}

/// Binds the coordinator, serves all four surfaces, and starts the
/// liveness sweep.
pub async fn spawn(config: CoordinatorConfig) -> Result<CoordinatorHandle, CoordinatorError> {
    let listener = TcpListener::bind(config.bind).await?;
    let addr = listener.local_addr()?;
    let public_port = if config.public_port == 0 {
        addr.port()
    } else {
        config.public_port
    };

    let state = CoordinatorState::new(config.clone(), public_port);
    let cancel = CancellationToken::new();

    let router = routes::router(Arc::clone(&state));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let shutdown = async move { cancel.cancelled().await };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "coordinator server exited with error");
            }
        });
    }

    tokio::spawn(Arc::clone(&state.sweeper).run(config.sweep_interval, cancel.clone()));

    info!(%addr, public_port, "coordinator listening");
    Ok(CoordinatorHandle {
        addr,
        state,
        cancel,
    })
}
