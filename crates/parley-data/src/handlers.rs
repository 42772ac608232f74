//! Axum handlers for the DataOps and DataParticipant surfaces.
//!
//! DataOps answers read queries from the coordinator with OK/FAIL
//! responses; DataParticipant is the two-phase-commit surface. Neither
//! ever propagates an internal error to the caller.

use crate::participant::Participant;
use crate::store::Store;
use axum::extract::State;
use axum::Json;
use parley_types::api::{
    CanCommitRequest, ChatroomExistsRequest, DoAbortRequest, DoCommitRequest, UserExistsRequest,
    VerifyOwnershipRequest, VerifyUserRequest,
};
use parley_types::{Ack, Response};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub participant: Arc<Participant>,
}

pub async fn healthz() -> &'static str {
    "ok"
}

// --- DataOps ---------------------------------------------------------------

pub async fn verify_user(
    State(state): State<AppState>,
    Json(req): Json<VerifyUserRequest>,
) -> Json<Response> {
    if state.store.verify_user(&req.username, &req.password) {
        Json(Response::ok("verified"))
    } else {
        Json(Response::fail("invalid credentials"))
    }
}

pub async fn user_exists(
    State(state): State<AppState>,
    Json(req): Json<UserExistsRequest>,
) -> Json<Response> {
    if state.store.user_exists(&req.username) {
        Json(Response::ok("user exists"))
    } else {
        Json(Response::fail("no such user"))
    }
}

pub async fn chatroom_exists(
    State(state): State<AppState>,
    Json(req): Json<ChatroomExistsRequest>,
) -> Json<Response> {
    if state.store.chatroom_exists(&req.chatroom) {
        Json(Response::ok("chatroom exists"))
    } else {
        Json(Response::fail("no such chatroom"))
    }
}

pub async fn verify_owner(
    State(state): State<AppState>,
    Json(req): Json<VerifyOwnershipRequest>,
) -> Json<Response> {
    if state.store.verify_owner(&req.chatroom, &req.username) {
        Json(Response::ok("owner verified"))
    } else {
        Json(Response::fail("not the owner"))
    }
}

// --- DataParticipant -------------------------------------------------------

pub async fn can_commit(
    State(state): State<AppState>,
    Json(req): Json<CanCommitRequest>,
) -> Json<Ack> {
    Json(Arc::clone(&state.participant).can_commit(req.transaction, req.participant_id))
}

pub async fn do_commit(
    State(state): State<AppState>,
    Json(req): Json<DoCommitRequest>,
) -> Json<Response> {
    state
        .participant
        .do_commit(&req.transaction, req.participant_id)
        .await;
    Json(Response::ok("committed"))
}

pub async fn do_abort(
    State(state): State<AppState>,
    Json(req): Json<DoAbortRequest>,
) -> Json<Response> {
    state.participant.do_abort(&req.transaction);
    Json(Response::ok("aborted"))
}
