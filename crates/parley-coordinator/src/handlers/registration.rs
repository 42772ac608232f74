//! Registration surface: data nodes and chat nodes announce themselves
//! here at startup, plus the informational server-time probe.

use crate::placement;
use crate::roster::NodeEntry;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use parley_types::api::{
    RegisterChatNodeRequest, RegisterDataNodeRequest, RegisterResponse, ServerTimeResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Appends the node to both data rosters (one id, two surfaces) and
/// re-places every chatroom the node replayed from its durable store.
/// Rooms that already live somewhere are skipped with a warning.
pub async fn register_data_node(
    State(state): State<AppState>,
    Json(req): Json<RegisterDataNodeRequest>,
) -> Json<RegisterResponse> {
    let node_id = Uuid::new_v4();
    state
        .rosters
        .data_ops
        .push(NodeEntry::new(node_id, req.host.clone(), req.ops_port))
        .await;
    state
        .rosters
        .data_participants
        .push(NodeEntry::new(node_id, req.host.clone(), req.participant_port))
        .await;
    info!(
        host = %req.host,
        ops_port = req.ops_port,
        participant_port = req.participant_port,
        %node_id,
        "data node registered"
    );

    for room in &req.known_rooms {
        match placement::inner_create_chatroom(&state.rosters, &state.chat, room).await {
            Ok(placed) => info!(room, host = %placed.host, "durable chatroom re-placed"),
            Err(e) => warn!(room, error = %e, "durable chatroom not re-placed"),
        }
    }

    Json(RegisterResponse {
        port: state.public_port,
    })
}

pub async fn register_chat_node(
    State(state): State<AppState>,
    Json(req): Json<RegisterChatNodeRequest>,
) -> Json<RegisterResponse> {
    let node_id = Uuid::new_v4();
    state
        .rosters
        .chat_nodes
        .push(NodeEntry::new(node_id, req.host.clone(), req.rpc_port))
        .await;
    info!(host = %req.host, rpc_port = req.rpc_port, %node_id, "chat node registered");
    Json(RegisterResponse {
        port: state.public_port,
    })
}

/// Clock probe for Cristian-style offset estimation at the nodes.
/// Informational only; nothing orders on it.
pub async fn server_time() -> Json<ServerTimeResponse> {
    Json(ServerTimeResponse {
        epoch_millis: chrono::Utc::now().timestamp_millis(),
    })
}
