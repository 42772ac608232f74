//! Chatroom lifecycle operations and the chat-log surface.

use crate::errors::{CoordinatorError, PlacementError};
use crate::placement::{self, RoomPlacement};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use parley_types::api::{
    ChatroomListResponse, ChatroomResponse, CreateChatroomRequest, DeleteChatroomRequest,
    LogMessageRequest, ReestablishChatroomRequest, NO_DATA_NODES_MESSAGE,
    RESERVED_CHARACTER_MESSAGE, ROOM_EXISTS_MESSAGE, ROOM_MISSING_MESSAGE, VERIFY_FAILED_MESSAGE,
};
use parley_types::{unauthorized_delete_message, validate_name, Op, Response};
use tracing::{debug, info, warn};

fn placement_response(placed: RoomPlacement) -> ChatroomResponse {
    ChatroomResponse::ok(placed.name, placed.host, placed.tcp_port, placed.rpc_port)
}

/// First reachable data node answers the existence question; `None` means
/// no node was reachable at all.
async fn chatroom_exists_anywhere(state: &AppState, name: &str) -> Option<bool> {
    let nodes = state.rosters.data_ops.snapshot().await;
    for node in &nodes {
        match state.data_ops.chatroom_exists(node, name).await {
            Ok(response) => return Some(response.is_ok()),
            Err(e) => debug!(node = %node, error = %e, "chatroomExists query failed, trying next"),
        }
    }
    None
}

/// Fans `getChatrooms` out to every chat node and concatenates; nodes that
/// fail to answer are skipped silently.
pub async fn list_chatrooms(State(state): State<AppState>) -> Json<ChatroomListResponse> {
    let nodes = state.rosters.chat_nodes.snapshot().await;
    let mut names = Vec::new();
    for node in &nodes {
        match state.chat.rooms(node).await {
            Ok(list) => names.extend(list.names),
            Err(e) => debug!(node = %node, error = %e, "skipping unreachable chat node"),
        }
    }
    Json(ChatroomListResponse { names })
}

/// Creates a chatroom: ownership is committed across the data nodes via
/// the explicit 2PC path, with placement on a chat node as the phase-B
/// side effect.
pub async fn create_chatroom(
    State(state): State<AppState>,
    Json(req): Json<CreateChatroomRequest>,
) -> Json<ChatroomResponse> {
    if validate_name(&req.name).is_err() {
        return Json(ChatroomResponse::fail(RESERVED_CHARACTER_MESSAGE));
    }
    match chatroom_exists_anywhere(&state, &req.name).await {
        Some(true) => return Json(ChatroomResponse::fail(ROOM_EXISTS_MESSAGE)),
        Some(false) => {}
        None => return Json(ChatroomResponse::fail(NO_DATA_NODES_MESSAGE)),
    }

    let transaction = state
        .driver
        .transaction(Op::CreateChatroom, &req.name, &req.username);
    let placed = state
        .driver
        .commit_with(transaction, || async {
            placement::inner_create_chatroom(&state.rosters, &state.chat, &req.name)
                .await
                .map_err(CoordinatorError::from)
        })
        .await;

    match placed {
        Ok(placed) => {
            info!(name = %req.name, owner = %req.username, host = %placed.host, "chatroom created");
            Json(placement_response(placed))
        }
        Err(CoordinatorError::Placement(e)) => Json(ChatroomResponse::fail(e.to_string())),
        Err(CoordinatorError::NoDataNodes) => Json(ChatroomResponse::fail(NO_DATA_NODES_MESSAGE)),
        Err(e) => {
            debug!(name = %req.name, error = %e, "chatroom creation did not commit");
            Json(ChatroomResponse::fail("Unable to create chatroom"))
        }
    }
}

/// Resolves a chatroom name to its current placement.
pub async fn get_chatroom(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<ChatroomResponse> {
    match placement::find_room(&state.rosters, &state.chat, &name).await {
        Some(placed) => Json(placement_response(placed)),
        None => Json(ChatroomResponse::fail(ROOM_MISSING_MESSAGE)),
    }
}

/// Deletes a chatroom behind three ordered gates (room exists, user
/// verified, user owns the room), then the explicit 2PC path with the
/// chat-node teardown as the side effect.
pub async fn delete_chatroom(
    State(state): State<AppState>,
    Json(req): Json<DeleteChatroomRequest>,
) -> Json<Response> {
    match chatroom_exists_anywhere(&state, &req.name).await {
        Some(true) => {}
        Some(false) => return Json(Response::fail(ROOM_MISSING_MESSAGE)),
        None => return Json(Response::fail(NO_DATA_NODES_MESSAGE)),
    }

    let nodes = state.rosters.data_ops.snapshot().await;
    let mut verified = false;
    for node in &nodes {
        match state
            .data_ops
            .verify_user(node, &req.username, &req.password)
            .await
        {
            Ok(response) if response.is_ok() => {
                verified = true;
                break;
            }
            Ok(_) => {}
            Err(e) => debug!(node = %node, error = %e, "verifyUser failed, trying next"),
        }
    }
    if !verified {
        return Json(Response::fail(VERIFY_FAILED_MESSAGE));
    }

    let mut owns = false;
    for node in &nodes {
        match state
            .data_ops
            .verify_owner(node, &req.name, &req.username)
            .await
        {
            Ok(response) if response.is_ok() => {
                owns = true;
                break;
            }
            Ok(_) => {}
            Err(e) => debug!(node = %node, error = %e, "verifyOwnership failed, trying next"),
        }
    }
    if !owns {
        return Json(Response::fail(unauthorized_delete_message(
            &req.username,
            &req.name,
        )));
    }

    let transaction = state
        .driver
        .transaction(Op::DeleteChatroom, &req.name, &req.username);
    let outcome = state
        .driver
        .commit_with(transaction, || async {
            placement::delete_room_anywhere(&state.rosters, &state.chat, &req.name)
                .await
                .map_err(CoordinatorError::from)
        })
        .await;

    match outcome {
        Ok(()) => {
            info!(name = %req.name, by = %req.username, "chatroom deleted");
            Json(Response::ok("Chatroom deleted"))
        }
        Err(e) => {
            warn!(name = %req.name, error = %e, "chatroom deletion did not commit");
            Json(Response::fail("Unable to delete chatroom"))
        }
    }
}

/// Single-flight recovery of a chatroom whose hosting node is presumed
/// dead: evict via an eager sweep, re-place, and treat "already exists"
/// as another client having won the race under this same lock.
pub async fn reestablish_chatroom(
    State(state): State<AppState>,
    Json(req): Json<ReestablishChatroomRequest>,
) -> Json<ChatroomResponse> {
    let _flight = state.reestablish.lock().await;
    info!(name = %req.name, user = %req.username, "re-establishment requested");
    state.sweeper.sweep_once().await;

    match placement::inner_create_chatroom(&state.rosters, &state.chat, &req.name).await {
        Ok(placed) => {
            info!(name = %req.name, host = %placed.host, "chatroom re-established");
            Json(placement_response(placed))
        }
        Err(PlacementError::RoomExists) => {
            // another client re-placed it while holding this mutex earlier
            match placement::find_room(&state.rosters, &state.chat, &req.name).await {
                Some(placed) => Json(placement_response(placed)),
                None => Json(ChatroomResponse::fail(ROOM_MISSING_MESSAGE)),
            }
        }
        Err(e) => {
            warn!(name = %req.name, error = %e, "re-establishment failed");
            Json(ChatroomResponse::fail(e.to_string()))
        }
    }
}

/// Chat-node-facing log surface: replicates one formatted line to every
/// live data node through the generic 2PC path.
pub async fn log_chat_message(
    State(state): State<AppState>,
    Json(req): Json<LogMessageRequest>,
) -> Json<Response> {
    let transaction = state
        .driver
        .transaction(Op::LogMessage, &req.chatroom, &req.line);
    match state.driver.generic_commit(transaction).await {
        Ok(()) => Json(Response::ok("logged")),
        Err(e) => {
            debug!(chatroom = %req.chatroom, error = %e, "log message did not commit");
            Json(Response::fail("Unable to log message"))
        }
    }
}
