//! Parley data node: a durable replica of users, chatroom ownership, and
//! chat logs, plus the two-phase-commit participant that keeps the replica
//! consistent with its peers.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod participant;
pub mod poll;
pub mod routes;
pub mod rpc;
pub mod store;

pub use config::DataNodeConfig;
pub use errors::DataNodeError;
pub use participant::Participant;
pub use poll::PollConfig;
pub use store::Store;

use crate::handlers::AppState;
use crate::rpc::CoordinatorClient;
use axum::Router;
use parley_types::api::RegisterDataNodeRequest;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Running data node: bound surfaces plus the shutdown token.
pub struct DataNodeHandle {
    pub ops_addr: SocketAddr,
    pub participant_addr: SocketAddr,
    pub store_root: PathBuf,
    pub store: Arc<Store>,
    pub participant: Arc<Participant>,
    pub cancel: CancellationToken,
}

/// Opens the durable store, serves both surfaces, and registers with the
/// coordinator (replaying the durable chatroom set so the coordinator can
/// re-place those rooms).
pub async fn spawn(config: DataNodeConfig) -> Result<DataNodeHandle, DataNodeError> {
    let store_root = config.store_root();
    let store = Arc::new(Store::open(&store_root)?);
    let coordinator = CoordinatorClient::new(config.coordinator_url.clone());
    let participant = Arc::new(Participant::new(
        Arc::clone(&store),
        coordinator.clone(),
        config.poll,
    ));
    let state = AppState {
        store: Arc::clone(&store),
        participant: Arc::clone(&participant),
    };

    let cancel = CancellationToken::new();
    let ops_listener = TcpListener::bind(config.ops_bind).await?;
    let ops_addr = ops_listener.local_addr()?;
    let participant_listener = TcpListener::bind(config.participant_bind).await?;
    let participant_addr = participant_listener.local_addr()?;

    serve_surface(ops_listener, routes::ops_router(state.clone()), &cancel, "data-ops");
    serve_surface(
        participant_listener,
        routes::participant_router(state),
        &cancel,
        "data-participant",
    );

    let request = RegisterDataNodeRequest {
        host: config.advertise_host.clone(),
        ops_port: ops_addr.port(),
        participant_port: participant_addr.port(),
        known_rooms: store.known_rooms(),
    };
    let registered = coordinator.register_data_node(&request).await?;
    info!(
        ops = %ops_addr,
        participant = %participant_addr,
        coordinator_port = registered.port,
        replayed_rooms = request.known_rooms.len(),
        "data node registered"
    );

    tokio::spawn(clock_probe(coordinator, cancel.clone()));

    Ok(DataNodeHandle {
        ops_addr,
        participant_addr,
        store_root,
        store,
        participant,
        cancel,
    })
}

fn serve_surface(
    listener: TcpListener,
    router: Router,
    cancel: &CancellationToken,
    surface: &'static str,
) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        let shutdown = async move { cancel.cancelled().await };
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!(surface, error = %e, "surface exited with error");
        }
    });
}

/// Periodic probe of the coordinator clock. Informational only; the offset
/// never feeds an ordering decision.
async fn clock_probe(coordinator: CoordinatorClient, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_secs(60));
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        match coordinator.server_time().await {
            Ok(time) => {
                let offset = time.epoch_millis - chrono::Utc::now().timestamp_millis();
                debug!(offset_ms = offset, "coordinator clock probe");
            }
            Err(e) => debug!(error = %e, "clock probe failed"),
        }
    }
}
