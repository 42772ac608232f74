//! The raw TCP surface clients subscribe through.
//!
//! Protocol: the client sends one line `<chatroom>:<username>`, the node
//! answers `success` or `fail`, and after `success` every published line
//! for the room arrives on this stream. The node keeps reading the stream
//! only to detect EOF: a client killed without `leaveChatroom` is cleaned
//! up here.

use crate::registry::RoomRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn run_listener(
    listener: TcpListener,
    registry: Arc<RoomRegistry>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("stream listener stopped");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    tokio::spawn(handle_subscriber(
                        socket,
                        peer,
                        Arc::clone(&registry),
                        cancel.clone(),
                    ));
                }
                Err(e) => warn!(error = %e, "accept failed"),
            }
        }
    }
}

async fn handle_subscriber(
    socket: TcpStream,
    peer: SocketAddr,
    registry: Arc<RoomRegistry>,
    cancel: CancellationToken,
) {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }
    let handshake = line.trim_end_matches(['\r', '\n']);
    let subscribed = handshake
        .split_once(':')
        .and_then(|(room_name, username)| {
            registry
                .get(room_name)
                .map(|room| (room, username.to_string()))
        });
    let (room, username) = match subscribed {
        Some(found) => found,
        None => {
            debug!(%peer, handshake, "rejecting subscription");
            let _ = write_half.write_all(b"fail\n").await;
            return;
        }
    };

    if write_half.write_all(b"success\n").await.is_err() {
        return;
    }
    info!(room = room.name(), username = %username, %peer, "subscriber connected");
    room.subscribe(&username, write_half);

    // EOF watch; nothing else arrives on this direction after the handshake
    loop {
        line.clear();
        tokio::select! {
            _ = cancel.cancelled() => {
                // node shutdown: release the subscriber so its stream closes
                room.unsubscribe(&username);
                return;
            }
            read = reader.read_line(&mut line) => match read {
                Ok(0) | Err(_) => {
                    if room.unsubscribe(&username) {
                        info!(room = room.name(), username = %username, "subscriber stream closed");
                    }
                    return;
                }
                Ok(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn listening_registry() -> (SocketAddr, Arc<RoomRegistry>, CancellationToken) {
        let registry = Arc::new(RoomRegistry::new());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        tokio::spawn(run_listener(listener, Arc::clone(&registry), cancel.clone()));
        (addr, registry, cancel)
    }

    async fn read_line_from(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            let n = stream.read(&mut byte).await.unwrap();
            if n == 0 || byte[0] == b'\n' {
                break;
            }
            buf.push(byte[0]);
        }
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn valid_handshake_subscribes_and_receives_lines() {
        let (addr, registry, _cancel) = listening_registry().await;
        registry.create("room1");

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"room1:alice\n").await.unwrap();
        assert_eq!(read_line_from(&mut stream).await, "success");

        // wait for the subscriber map to reflect the connection
        let room = registry.get("room1").unwrap();
        for _ in 0..50 {
            if room.subscriber_count() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(room.subscriber_count(), 1);

        room.publish("alice >> hello");
        assert_eq!(read_line_from(&mut stream).await, "alice >> hello");
    }

    #[tokio::test]
    async fn unknown_room_is_rejected() {
        let (addr, _registry, _cancel) = listening_registry().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"ghost:alice\n").await.unwrap();
        assert_eq!(read_line_from(&mut stream).await, "fail");
    }

    #[tokio::test]
    async fn malformed_handshake_is_rejected() {
        let (addr, registry, _cancel) = listening_registry().await;
        registry.create("room1");
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"no-separator\n").await.unwrap();
        assert_eq!(read_line_from(&mut stream).await, "fail");
    }

    #[tokio::test]
    async fn client_eof_unsubscribes() {
        let (addr, registry, _cancel) = listening_registry().await;
        registry.create("room1");

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"room1:alice\n").await.unwrap();
        assert_eq!(read_line_from(&mut stream).await, "success");
        let room = registry.get("room1").unwrap();
        for _ in 0..50 {
            if room.subscriber_count() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        drop(stream);
        for _ in 0..50 {
            if room.subscriber_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(room.subscriber_count(), 0);
    }
}
