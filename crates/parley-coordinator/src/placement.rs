//! Chatroom placement: choosing a chat node for a new room, locating the
//! node currently hosting a room, and tearing a room down.

use crate::errors::PlacementError;
use crate::roster::Rosters;
use crate::rpc::ChatNodeClient;
use parley_types::api::ChatroomDataResponse;
use tracing::{debug, warn};

/// Where a live chatroom can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPlacement {
    pub name: String,
    pub host: String,
    pub tcp_port: u16,
    pub rpc_port: u16,
}

/// Places `name` on the least-loaded chat node.
///
/// Runs entirely under the chat-node roster lock, so two placements (or a
/// placement and a sweep) can never interleave. Selection minimizes
/// subscriber count, then chatroom count, then falls back to roster
/// iteration order. Nodes that fail a query are skipped.
pub async fn inner_create_chatroom(
    rosters: &Rosters,
    chat: &ChatNodeClient,
    name: &str,
) -> Result<RoomPlacement, PlacementError> {
    let nodes = rosters.chat_nodes.lock().await;
    if nodes.is_empty() {
        return Err(PlacementError::NoChatNodes);
    }

    for node in nodes.iter() {
        match chat.rooms(node).await {
            Ok(list) if list.names.iter().any(|n| n == name) => {
                return Err(PlacementError::RoomExists);
            }
            Ok(_) => {}
            Err(e) => debug!(node = %node, error = %e, "skipping unreachable node in existence scan"),
        }
    }

    let mut reports = Vec::with_capacity(nodes.len());
    for node in nodes.iter() {
        match chat.load(node).await {
            Ok(report) => reports.push((node.clone(), report)),
            Err(e) => debug!(node = %node, error = %e, "skipping unreachable node in load scan"),
        }
    }
    let (winner, report) = reports
        .into_iter()
        .reduce(|best, candidate| if is_less_loaded(&candidate.1, &best.1) { candidate } else { best })
        .ok_or_else(|| PlacementError::NodeFailed("no chat node answered the load query".into()))?;

    match chat.create_room(&winner, name).await {
        Ok(response) if response.is_ok() => {
            debug!(name, node = %winner, "chatroom placed");
            Ok(RoomPlacement {
                name: name.to_string(),
                host: report.host,
                tcp_port: report.tcp_port,
                rpc_port: report.rpc_port,
            })
        }
        Ok(response) => {
            warn!(name, node = %winner, message = %response.message, "chat node refused creation");
            Err(PlacementError::NodeFailed(response.message))
        }
        Err(e) => {
            warn!(name, node = %winner, error = %e, "winner unreachable during creation");
            Err(PlacementError::NodeFailed(e.to_string()))
        }
    }
}

/// Strictly-less comparison used for the placement tie-break; equal load
/// keeps the earlier (roster-order) candidate.
fn is_less_loaded(candidate: &ChatroomDataResponse, best: &ChatroomDataResponse) -> bool {
    (candidate.user_count, candidate.chatroom_count) < (best.user_count, best.chatroom_count)
}

/// Scans chat nodes for the one hosting `name`. Unreachable nodes are
/// skipped; `None` means no live node hosts the room.
pub async fn find_room(
    rosters: &Rosters,
    chat: &ChatNodeClient,
    name: &str,
) -> Option<RoomPlacement> {
    let nodes = rosters.chat_nodes.snapshot().await;
    for node in &nodes {
        let hosts_it = match chat.rooms(node).await {
            Ok(list) => list.names.iter().any(|n| n == name),
            Err(_) => false,
        };
        if !hosts_it {
            continue;
        }
        match chat.load(node).await {
            Ok(report) => {
                return Some(RoomPlacement {
                    name: name.to_string(),
                    host: report.host,
                    tcp_port: report.tcp_port,
                    rpc_port: report.rpc_port,
                })
            }
            Err(e) => debug!(node = %node, error = %e, "host found but load query failed"),
        }
    }
    None
}

/// Deletes `name` on whichever chat node hosts it. A room hosted nowhere
/// (its node died and nobody re-established) deletes vacuously; the
/// durable state must still go.
pub async fn delete_room_anywhere(
    rosters: &Rosters,
    chat: &ChatNodeClient,
    name: &str,
) -> Result<(), PlacementError> {
    let nodes = rosters.chat_nodes.snapshot().await;
    for node in &nodes {
        let hosts_it = match chat.rooms(node).await {
            Ok(list) => list.names.iter().any(|n| n == name),
            Err(_) => false,
        };
        if !hosts_it {
            continue;
        }
        return match chat.delete_room(node, name).await {
            Ok(response) if response.is_ok() => Ok(()),
            Ok(response) => Err(PlacementError::NodeFailed(response.message)),
            Err(e) => Err(PlacementError::NodeFailed(e.to_string())),
        };
    }
    debug!(name, "no chat node hosts the room; nothing to tear down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(user_count: usize, chatroom_count: usize, rpc_port: u16) -> ChatroomDataResponse {
        ChatroomDataResponse {
            chatroom_count,
            user_count,
            host: "127.0.0.1".to_string(),
            rpc_port,
            tcp_port: rpc_port + 1,
        }
    }

    fn pick(reports: &[ChatroomDataResponse]) -> usize {
        let mut best = 0;
        for i in 1..reports.len() {
            if is_less_loaded(&reports[i], &reports[best]) {
                best = i;
            }
        }
        best
    }

    #[test]
    fn fewer_users_wins() {
        assert_eq!(pick(&[report(3, 0, 1), report(1, 9, 2)]), 1);
    }

    #[test]
    fn user_tie_breaks_on_fewer_rooms() {
        assert_eq!(pick(&[report(0, 1, 1), report(0, 0, 2)]), 1);
    }

    #[test]
    fn full_tie_keeps_iteration_order() {
        assert_eq!(pick(&[report(0, 0, 1), report(0, 0, 2)]), 0);
    }
}
