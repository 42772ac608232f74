//! Parley chat node: hosts live chatrooms, fans published messages out to
//! subscriber streams, and forwards every chat line to the coordinator
//! for durable replication.

pub mod config;
pub mod errors;
pub mod forward;
pub mod handlers;
pub mod registry;
pub mod room;
pub mod routes;
pub mod rpc;
pub mod stream;

pub use config::ChatNodeConfig;
pub use errors::ChatNodeError;
pub use registry::RoomRegistry;
pub use room::Chatroom;

use crate::forward::LogForwarder;
use crate::handlers::AppState;
use crate::rpc::CoordinatorClient;
use parley_types::api::RegisterChatNodeRequest;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Running chat node: bound surfaces plus the shutdown token.
pub struct ChatNodeHandle {
    pub rpc_addr: SocketAddr,
    pub stream_addr: SocketAddr,
    pub registry: Arc<RoomRegistry>,
    pub cancel: CancellationToken,
}

/// Binds both surfaces, registers with the coordinator, and starts the
/// stream listener.
pub async fn spawn(config: ChatNodeConfig) -> Result<ChatNodeHandle, ChatNodeError> {
    let registry = Arc::new(RoomRegistry::new());
    let coordinator = CoordinatorClient::new(config.coordinator_url.clone());
    let forwarder = Arc::new(LogForwarder::new(
        coordinator.clone(),
        config.log_retry_delay,
    ));

    let rpc_listener = TcpListener::bind(config.rpc_bind).await?;
    let rpc_addr = rpc_listener.local_addr()?;
    let stream_listener = TcpListener::bind(config.stream_bind).await?;
    let stream_addr = stream_listener.local_addr()?;

    let state = AppState {
        registry: Arc::clone(&registry),
        forwarder,
        advertise_host: config.advertise_host.clone(),
        rpc_port: rpc_addr.port(),
        tcp_port: stream_addr.port(),
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        let router = routes::router(state);
        tokio::spawn(async move {
            let shutdown = async move { cancel.cancelled().await };
            if let Err(e) = axum::serve(rpc_listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "chat node server exited with error");
            }
        });
    }
    tokio::spawn(stream::run_listener(
        stream_listener,
        Arc::clone(&registry),
        cancel.clone(),
    ));

    let registered = coordinator
        .register_chat_node(&RegisterChatNodeRequest {
            host: config.advertise_host.clone(),
            rpc_port: rpc_addr.port(),
        })
        .await?;
    info!(
        rpc = %rpc_addr,
        stream = %stream_addr,
        coordinator_port = registered.port,
        "chat node registered"
    );

    tokio::spawn(clock_probe(coordinator, cancel.clone()));

    Ok(ChatNodeHandle {
        rpc_addr,
        stream_addr,
        registry,
        cancel,
    })
}

/// Periodic probe of the coordinator clock. Informational only.
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
