//! Axum handlers for the chat node's management and user surfaces.

use crate::forward::LogForwarder;
use crate::registry::RoomRegistry;
use axum::extract::State;
use axum::Json;
use parley_types::api::{
    ChatRequest, ChatroomDataResponse, ChatroomListResponse, CreateRoomRequest, DeleteRoomRequest,
    JoinChatroomRequest, LeaveChatroomRequest, ROOM_EXISTS_MESSAGE, ROOM_MISSING_MESSAGE,
};
use parley_types::{chat_line, Response, SYSTEM_SENDER};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub forwarder: Arc<LogForwarder>,
    pub advertise_host: String,
    pub rpc_port: u16,
    pub tcp_port: u16,
}

pub async fn healthz() -> &'static str {
    "ok"
}

// --- management surface (coordinator-facing) -------------------------------

pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> Json<Response> {
    if state.registry.create(&req.name) {
        Json(Response::ok("chatroom created"))
    } else {
        Json(Response::fail(ROOM_EXISTS_MESSAGE))
    }
}

pub async fn delete_room(
    State(state): State<AppState>,
    Json(req): Json<DeleteRoomRequest>,
) -> Json<Response> {
    if state.registry.delete(&req.name) {
        Json(Response::ok("chatroom deleted"))
    } else {
        Json(Response::fail(ROOM_MISSING_MESSAGE))
    }
}

pub async fn rooms(State(state): State<AppState>) -> Json<ChatroomListResponse> {
    Json(ChatroomListResponse {
        names: state.registry.names(),
    })
}

pub async fn load(State(state): State<AppState>) -> Json<ChatroomDataResponse> {
    let (chatroom_count, user_count) = state.registry.load();
    Json(ChatroomDataResponse {
        chatroom_count,
        user_count,
        host: state.advertise_host.clone(),
        rpc_port: state.rpc_port,
        tcp_port: state.tcp_port,
    })
}

// --- user surface (client-facing) ------------------------------------------

pub async fn join_chatroom(
    State(state): State<AppState>,
    Json(req): Json<JoinChatroomRequest>,
) -> Json<Response> {
    let Some(room) = state.registry.get(&req.chatroom) else {
        return Json(Response::fail(ROOM_MISSING_MESSAGE));
    };
    room.publish(&chat_line(
        SYSTEM_SENDER,
        &format!("{} has joined the chat", req.username),
    ));
    Json(Response::ok("joined"))
}

pub async fn leave_chatroom(
    State(state): State<AppState>,
    Json(req): Json<LeaveChatroomRequest>,
) -> Json<Response> {
    let Some(room) = state.registry.get(&req.chatroom) else {
        return Json(Response::fail(ROOM_MISSING_MESSAGE));
    };
    room.unsubscribe(&req.username);
    room.publish(&chat_line(
        SYSTEM_SENDER,
        &format!("{} has left the chat", req.username),
    ));
    Json(Response::ok("left"))
}

/// Publishes the message to the room's subscribers, then logs the same
/// line durably through the coordinator; the call completes only once the
/// line is replicated.
pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<Response> {
    let Some(room) = state.registry.get(&req.chatroom) else {
        return Json(Response::fail(ROOM_MISSING_MESSAGE));
    };
    let line = chat_line(&req.username, &req.message);
    room.publish(&line);
    state.forwarder.forward(&req.chatroom, &line).await;
    Json(Response::ok("sent"))
}
