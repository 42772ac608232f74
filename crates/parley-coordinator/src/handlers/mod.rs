pub mod chatrooms;
pub mod decisions;
pub mod registration;
pub mod users;

pub async fn healthz() -> &'static str {
    "ok"
}
