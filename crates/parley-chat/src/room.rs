//! A live chatroom: its subscribers and the fan-out to their streams.
//!
//! Each subscriber is an unbounded channel feeding a writer task that owns
//! the subscriber's TCP write half. `publish` enqueues the line to every
//! channel, which preserves per-stream delivery order without holding any
//! lock across socket writes. A write failure is logged but does not reap
//! the subscriber; cleanup happens on `leaveChatroom` or stream EOF.

use parking_lot::Mutex;
use parley_types::ROOM_CLOSED_SENTINEL;
use std::collections::HashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

enum RoomEvent {
    Line(String),
    Closed,
}

struct Subscriber {
    tx: mpsc::UnboundedSender<RoomEvent>,
}

pub struct Chatroom {
    name: String,
    subscribers: Mutex<HashMap<String, Subscriber>>,
}

impl Chatroom {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Adds a subscriber, spawning the writer task that owns its stream.
    /// A second subscription under the same username supersedes the first;
    /// the superseded writer drains and closes its stream.
    pub fn subscribe<W>(&self, username: &str, writer: W)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(
            self.name.clone(),
            username.to_string(),
            writer,
            rx,
        ));
        let superseded = self
            .subscribers
            .lock()
            .insert(username.to_string(), Subscriber { tx });
        if superseded.is_some() {
            debug!(room = %self.name, username, "subscription superseded");
        }
    }

    /// Removes a subscriber and closes its stream. Returns false when the
    /// username was not subscribed.
    pub fn unsubscribe(&self, username: &str) -> bool {
        self.subscribers.lock().remove(username).is_some()
    }

    /// Delivers one already-formatted line to every subscriber. Dead
    /// writers are logged, not removed.
    pub fn publish(&self, line: &str) {
        for (username, subscriber) in self.subscribers.lock().iter() {
            if subscriber
                .tx
                .send(RoomEvent::Line(line.to_string()))
                .is_err()
            {
                warn!(room = %self.name, username, "subscriber writer gone; line dropped");
            }
        }
    }

    /// Sends the room-closed sentinel to every subscriber and drops them
    /// all; their writer tasks shut the streams down.
    pub fn close(&self) {
        let mut subscribers = self.subscribers.lock();
        debug!(room = %self.name, subscribers = subscribers.len(), "closing room");
        for (_, subscriber) in subscribers.drain() {
            let _ = subscriber.tx.send(RoomEvent::Closed);
        }
    }
}

async fn write_loop<W>(
    room: String,
    username: String,
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<RoomEvent>,
) where
    W: AsyncWrite + Unpin + Send + 'static,
{
    while let Some(event) = rx.recv().await {
        match event {
            RoomEvent::Line(line) => {
                if let Err(e) = writer.write_all(format!("{}\n", line).as_bytes()).await {
                    warn!(room, username, error = %e, "stream write failed");
                }
            }
            RoomEvent::Closed => {
                let _ = writer
                    .write_all(format!("{}\n", ROOM_CLOSED_SENTINEL).as_bytes())
                    .await;
                let _ = writer.shutdown().await;
                return;
            }
        }
    }
    // sender dropped: unsubscribed or superseded
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    async fn next_line<R: tokio::io::AsyncRead + Unpin>(reader: &mut BufReader<R>) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        line.trim_end().to_string()
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber_once() {
        let room = Chatroom::new("room1");
        let (alice_w, alice_r) = tokio::io::duplex(1024);
        let (bob_w, bob_r) = tokio::io::duplex(1024);
        room.subscribe("alice", alice_w);
        room.subscribe("bob", bob_w);
        assert_eq!(room.subscriber_count(), 2);

        room.publish("alice >> hello");

        let mut alice = BufReader::new(alice_r);
        let mut bob = BufReader::new(bob_r);
        assert_eq!(next_line(&mut alice).await, "alice >> hello");
        assert_eq!(next_line(&mut bob).await, "alice >> hello");
    }

    #[tokio::test]
    async fn lines_arrive_in_publish_order_per_stream() {
        let room = Chatroom::new("room1");
        let (w, r) = tokio::io::duplex(1024);
        room.subscribe("alice", w);

        room.publish("alice >> one");
        room.publish("bob >> two");
        room.publish("alice >> three");

        let mut reader = BufReader::new(r);
        assert_eq!(next_line(&mut reader).await, "alice >> one");
        assert_eq!(next_line(&mut reader).await, "bob >> two");
        assert_eq!(next_line(&mut reader).await, "alice >> three");
    }

    #[tokio::test]
    async fn close_emits_the_sentinel_and_ends_the_stream() {
        let room = Chatroom::new("room1");
        let (w, r) = tokio::io::duplex(1024);
        room.subscribe("alice", w);

        room.close();
        assert_eq!(room.subscriber_count(), 0);

        let mut reader = BufReader::new(r);
        assert_eq!(next_line(&mut reader).await, "\\c");
        let mut rest = String::new();
        reader.read_line(&mut rest).await.unwrap();
        assert_eq!(rest, "", "stream ends after the sentinel");
    }

    #[tokio::test]
    async fn unsubscribed_user_receives_nothing_more() {
        let room = Chatroom::new("room1");
        let (w, r) = tokio::io::duplex(1024);
        room.subscribe("alice", w);
        assert!(room.unsubscribe("alice"));
        assert!(!room.unsubscribe("alice"));

        room.publish("bob >> after you left");

        let mut reader = BufReader::new(r);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "", "stream closed without delivering the line");
    }
}
