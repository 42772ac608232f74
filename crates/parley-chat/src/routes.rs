use crate::handlers::{self, AppState};
use axum::routing::{get, post};
use axum::Router;

/// Management (coordinator-facing) and user (client-facing) surfaces.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/rooms", get(handlers::rooms).post(handlers::create_room))
        .route("/rooms/delete", post(handlers::delete_room))
        .route("/load", get(handlers::load))
        .route("/rooms/join", post(handlers::join_chatroom))
        .route("/rooms/leave", post(handlers::leave_chatroom))
        .route("/rooms/chat", post(handlers::chat))
        .with_state(state)
}
