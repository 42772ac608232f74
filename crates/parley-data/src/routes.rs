use crate::handlers::{self, AppState};
use axum::routing::{get, post};
use axum::Router;

/// Read-query surface served on the node's ops port.
pub fn ops_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/users/verify", post(handlers::verify_user))
        .route("/users/exists", post(handlers::user_exists))
        .route("/chatrooms/exists", post(handlers::chatroom_exists))
        .route("/chatrooms/verify-owner", post(handlers::verify_owner))
        .with_state(state)
}

/// Two-phase-commit surface served on the node's participant port.
pub fn participant_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/txn/can-commit", post(handlers::can_commit))
        .route("/txn/do-commit", post(handlers::do_commit))
        .route("/txn/do-abort", post(handlers::do_abort))
        .with_state(state)
}
