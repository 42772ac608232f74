//! Programmatic client for the Parley chatroom service.
//!
//! The interactive prompt and chat window live elsewhere; this crate pins
//! the client-side contracts: the coordinator's user operations, the chat
//! node's join/leave/chat calls, and the subscription byte stream with
//! its room-closed sentinel and disconnect detection.

pub mod chat;
pub mod coordinator;
pub mod errors;

pub use chat::{ChatNodeClient, RoomEvent, RoomStream};
pub use coordinator::CoordinatorClient;
pub use errors::ClientError;
