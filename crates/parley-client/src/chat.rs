//! Client side of a chatroom: the RPC operations on the hosting chat node
//! and the subscription byte stream.

use crate::errors::ClientError;
use parley_types::api::{
    ChatRequest, ChatroomResponse, JoinChatroomRequest, LeaveChatroomRequest,
};
use parley_types::{Response, ROOM_CLOSED_SENTINEL};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::debug;

/// Typed client for a chat node's user surface, addressed from a
/// placement returned by the coordinator.
#[derive(Clone)]
pub struct ChatNodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatNodeClient {
    pub fn from_placement(placement: &ChatroomResponse) -> Self {
        Self::new(format!("http://{}:{}", placement.host, placement.rpc_port))
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn join(&self, chatroom: &str, username: &str) -> Result<Response, ClientError> {
        let response = self
            .http
            .post(format!("{}/rooms/join", self.base_url))
            .json(&JoinChatroomRequest {
                chatroom: chatroom.to_string(),
                username: username.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn leave(&self, chatroom: &str, username: &str) -> Result<Response, ClientError> {
        let response = self
            .http
            .post(format!("{}/rooms/leave", self.base_url))
            .json(&LeaveChatroomRequest {
                chatroom: chatroom.to_string(),
                username: username.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    /// Publishes a message; returns once the line is fanned out and
    /// durably logged.
    pub async fn chat(
        &self,
        chatroom: &str,
        username: &str,
        message: &str,
    ) -> Result<Response, ClientError> {
        let response = self
            .http
            .post(format!("{}/rooms/chat", self.base_url))
            .json(&ChatRequest {
                chatroom: chatroom.to_string(),
                username: username.to_string(),
                message: message.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}

/// What the receive side of a subscription yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// One formatted message line, `<sender> >> <text>`.
    Message(String),
    /// The room-closed sentinel: the chatroom was deleted.
    Closed,
    /// The stream ended without the sentinel; the chat node is presumed
    /// dead and `reestablishChatroom` is in order.
    Disconnected,
}

/// The subscription byte stream. A background task reads lines into an
/// event channel; dropping the stream aborts the task and closes the
/// socket, which is how the chat node learns the subscriber is gone.
pub struct RoomStream {
    events: mpsc::UnboundedReceiver<RoomEvent>,
    reader_task: tokio::task::JoinHandle<()>,
}

impl RoomStream {
    /// Connects to `host:tcp_port`, performs the `chatroom:username`
    /// handshake, and starts the receive task.
    pub async fn connect(
        host: &str,
        tcp_port: u16,
        chatroom: &str,
        username: &str,
    ) -> Result<Self, ClientError> {
        let mut stream = TcpStream::connect((host, tcp_port)).await?;
        stream
            .write_all(format!("{}:{}\n", chatroom, username).as_bytes())
            .await?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(ClientError::HandshakeEof);
        }
        if line.trim_end_matches(['\r', '\n']) != "success" {
            return Err(ClientError::HandshakeRejected);
        }

        let (tx, events) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(async move {
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => {
                        let _ = tx.send(RoomEvent::Disconnected);
                        return;
                    }
                    Ok(_) => {
                        let text = line.trim_end_matches(['\r', '\n']);
                        if text == ROOM_CLOSED_SENTINEL {
                            debug!("room-closed sentinel received");
                            let _ = tx.send(RoomEvent::Closed);
                            return;
                        }
                        if tx.send(RoomEvent::Message(text.to_string())).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(Self {
            events,
            reader_task,
        })
    }

    /// Next event from the stream; `Disconnected` once the receive task
    /// has ended.
    pub async fn next_event(&mut self) -> RoomEvent {
        self.events.recv().await.unwrap_or(RoomEvent::Disconnected)
    }
}

impl Drop for RoomStream {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}
