use crate::handlers::{self, chatrooms, decisions, registration, users};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// All four coordinator surfaces on one router: Registration, UserOps,
/// the chat-log surface, and DecisionOps.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/time", get(registration::server_time))
        .route("/register/data", post(registration::register_data_node))
        .route("/register/chat", post(registration::register_chat_node))
        .route("/users/register", post(users::register_user))
        .route("/users/login", post(users::login))
        .route(
            "/chatrooms",
            get(chatrooms::list_chatrooms).post(chatrooms::create_chatroom),
        )
        .route("/chatrooms/delete", post(chatrooms::delete_chatroom))
        .route("/chatrooms/reestablish", post(chatrooms::reestablish_chatroom))
        .route("/chatrooms/:name", get(chatrooms::get_chatroom))
        .route("/log", post(chatrooms::log_chat_message))
        .route("/txn/decision", post(decisions::get_decision))
        .route("/txn/committed", post(decisions::have_committed))
        .with_state(state)
}
