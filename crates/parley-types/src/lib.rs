//! Shared wire model for the Parley chatroom service.
//!
//! Every remote surface in the system exchanges the types defined here:
//! the transaction model driven through two-phase commit, the structured
//! response values, and the request bodies for each endpoint. The fixed
//! user-visible message strings live here too so that the coordinator,
//! the nodes, and the test suites agree on them byte-for-byte.

pub mod api;
pub mod transaction;
pub mod validate;

pub use api::{
    unauthorized_delete_message, Ack, ChatroomDataResponse, ChatroomListResponse,
    ChatroomResponse, RegisterResponse, Response, Status,
};
pub use transaction::{Op, Transaction};
pub use validate::{validate_name, ValidationError, FIELD_SEPARATOR};

/// Sender name used for join/leave notices on the message stream.
pub const SYSTEM_SENDER: &str = "System";

/// Room-closed sentinel line written to every subscriber stream when a
/// chatroom is torn down. Two literal bytes, backslash then 'c'.
pub const ROOM_CLOSED_SENTINEL: &str = "\\c";

/// Notice a client displays when it receives the room-closed sentinel.
pub const ROOM_CLOSED_NOTICE: &str =
    "The chatroom has been deleted; no more messages may be delivered";

/// Formats a chat line the way it appears on subscriber streams and in the
/// durable chat logs.
pub fn chat_line(sender: &str, text: &str) -> String {
    format!("{} >> {}", sender, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_line_framing() {
        assert_eq!(chat_line("alice", "hello"), "alice >> hello");
        assert_eq!(
            chat_line(SYSTEM_SENDER, "alice has joined the chat"),
            "System >> alice has joined the chat"
        );
    }

    #[test]
    fn sentinel_is_two_bytes() {
        assert_eq!(ROOM_CLOSED_SENTINEL.as_bytes(), b"\\c");
    }
}
