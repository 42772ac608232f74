//! User-facing operations on credentials: registration and login.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use parley_types::api::{
    LoginRequest, RegisterUserRequest, NO_DATA_NODES_MESSAGE, REGISTER_FAILED_MESSAGE,
    RESERVED_CHARACTER_MESSAGE, USER_EXISTS_MESSAGE, VERIFY_FAILED_MESSAGE,
};
use parley_types::{validate_name, Op, Response};
use tracing::{debug, info};

/// Creates a user through the generic 2PC path, gated on an existence
/// query against any reachable data node.
pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Json<Response> {
    if validate_name(&req.username).is_err() || validate_name(&req.password).is_err() {
        return Json(Response::fail(RESERVED_CHARACTER_MESSAGE));
    }

    let nodes = state.rosters.data_ops.snapshot().await;
    if nodes.is_empty() {
        return Json(Response::fail(NO_DATA_NODES_MESSAGE));
    }
    // first reachable node answers the existence question
    let mut answered = false;
    for node in &nodes {
        match state.data_ops.user_exists(node, &req.username).await {
            Ok(response) => {
                if response.is_ok() {
                    return Json(Response::fail(USER_EXISTS_MESSAGE));
                }
                answered = true;
                break;
            }
            Err(e) => debug!(node = %node, error = %e, "userExists query failed, trying next"),
        }
    }
    if !answered {
        return Json(Response::fail(NO_DATA_NODES_MESSAGE));
    }

    let transaction = state
        .driver
        .transaction(Op::CreateUser, &req.username, &req.password);
    match state.driver.generic_commit(transaction).await {
        Ok(()) => {
            info!(username = %req.username, "user registered");
            Json(Response::ok("User registered"))
        }
        Err(e) => {
            debug!(username = %req.username, error = %e, "registration did not commit");
            Json(Response::fail(REGISTER_FAILED_MESSAGE))
        }
    }
}

/// Checks credentials against the data nodes in roster order; the first
/// OK wins. No 2PC.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Json<Response> {
    let nodes = state.rosters.data_ops.snapshot().await;
    if nodes.is_empty() {
        return Json(Response::fail(NO_DATA_NODES_MESSAGE));
    }
    for node in &nodes {
        match state
            .data_ops
            .verify_user(node, &req.username, &req.password)
            .await
        {
            Ok(response) if response.is_ok() => {
                info!(username = %req.username, "login succeeded");
                return Json(Response::ok("Login successful"));
            }
            Ok(_) => {}
            Err(e) => debug!(node = %node, error = %e, "verifyUser failed, trying next"),
        }
    }
    Json(Response::fail(VERIFY_FAILED_MESSAGE))
}
