//! Request and response bodies for every remote surface.

use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome marker carried by [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ok,
    Fail,
}

/// The structured value returned by most operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
}

impl Response {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Vote and decision value exchanged during two-phase commit.
///
/// `Na` means "not yet decided" when returned from the coordinator's
/// decision table, and never appears as a participant vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ack {
    Yes,
    No,
    Na,
}

/// Placement of a live chatroom: where the client should connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatroomResponse {
    pub status: Status,
    pub message: String,
    pub name: String,
    pub host: String,
    pub tcp_port: u16,
    pub rpc_port: u16,
}

impl ChatroomResponse {
    pub fn ok(name: impl Into<String>, host: impl Into<String>, tcp_port: u16, rpc_port: u16) -> Self {
        Self {
            status: Status::Ok,
            message: String::new(),
            name: name.into(),
            host: host.into(),
            tcp_port,
            rpc_port,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            message: message.into(),
            name: String::new(),
            host: String::new(),
            tcp_port: 0,
            rpc_port: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatroomListResponse {
    pub names: Vec<String>,
}

/// Load report from a chat node, used for placement decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatroomDataResponse {
    pub chatroom_count: usize,
    pub user_count: usize,
    pub host: String,
    pub rpc_port: u16,
    pub tcp_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTimeResponse {
    pub epoch_millis: i64,
}

// ---------------------------------------------------------------------------
// Registration surface (coordinator)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDataNodeRequest {
    pub host: String,
    pub ops_port: u16,
    pub participant_port: u16,
    /// Chatrooms found in this node's durable store at startup; the
    /// coordinator re-places each of them on a live chat node.
    pub known_rooms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterChatNodeRequest {
    pub host: String,
    pub rpc_port: u16,
}

// ---------------------------------------------------------------------------
// UserOps surface (coordinator)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatroomRequest {
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteChatroomRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReestablishChatroomRequest {
    pub name: String,
    pub username: String,
}

// ---------------------------------------------------------------------------
// ChatOps log surface (coordinator) and DecisionOps surface (coordinator)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessageRequest {
    pub chatroom: String,
    pub line: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDecisionRequest {
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaveCommittedRequest {
    pub transaction: Transaction,
    pub participant_id: Uuid,
}

// ---------------------------------------------------------------------------
// DataOps surface (data node)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserExistsRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatroomExistsRequest {
    pub chatroom: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOwnershipRequest {
    pub chatroom: String,
    pub username: String,
}

// ---------------------------------------------------------------------------
// DataParticipant surface (data node)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanCommitRequest {
    pub transaction: Transaction,
    /// Opaque participant identifier assigned at registration; echoed back
    /// through `haveCommitted` so the coordinator can correlate the ack.
    pub participant_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoCommitRequest {
    pub transaction: Transaction,
    pub participant_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoAbortRequest {
    pub transaction: Transaction,
}

// ---------------------------------------------------------------------------
// Chat node surfaces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRoomRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinChatroomRequest {
    pub chatroom: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveChatroomRequest {
    pub chatroom: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub chatroom: String,
    pub username: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Fixed user-visible messages
// ---------------------------------------------------------------------------

/// Load-bearing sentinel: `reestablishChatroom` uses this exact string to
/// distinguish "another client already re-placed the room" from an
/// unrecoverable placement failure.
pub const ROOM_EXISTS_MESSAGE: &str = "A chatroom with this name already exists";

pub const RESERVED_CHARACTER_MESSAGE: &str = "Names may not contain ':'";
pub const USER_EXISTS_MESSAGE: &str = "User already exists";
pub const REGISTER_FAILED_MESSAGE: &str = "Unable to register user";
pub const VERIFY_FAILED_MESSAGE: &str = "Unable to verify user";
pub const ROOM_MISSING_MESSAGE: &str = "Chatroom doesn't exist";
pub const NO_CHAT_NODES_MESSAGE: &str = "No chat nodes are available";
pub const NO_DATA_NODES_MESSAGE: &str = "No data nodes are available";

/// Message for the ownership gate on chatroom deletion.
pub fn unauthorized_delete_message(username: &str, chatroom: &str) -> String {
    format!(
        "User \"{}\" is unauthorized to delete chatroom \"{}\"",
        username, chatroom
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_helpers() {
        assert!(Response::ok("done").is_ok());
        assert!(!Response::fail("nope").is_ok());
    }

    #[test]
    fn ack_wire_values() {
        assert_eq!(serde_json::to_string(&Ack::Na).unwrap(), "\"NA\"");
        assert_eq!(serde_json::to_string(&Ack::Yes).unwrap(), "\"YES\"");
    }

    #[test]
    fn unauthorized_message_quotes_both_names() {
        let msg = unauthorized_delete_message("bad_user", "room1");
        assert_eq!(
            msg,
            "User \"bad_user\" is unauthorized to delete chatroom \"room1\""
        );
    }
}
