//! Rosters of live nodes.
//!
//! The coordinator holds three ordered rosters under independent locks:
//! `chat_nodes`, `data_ops`, and `data_participants`. The last two refer to
//! the same physical data nodes through two different surfaces; their
//! entries share the node's id. Rosters store addresses, never live
//! connections; thin RPC stubs are constructed per call.

use std::fmt;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub id: Uuid,
    pub host: String,
    pub port: u16,
}

impl NodeEntry {
    pub fn new(id: Uuid, host: impl Into<String>, port: u16) -> Self {
        Self {
            id,
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for NodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One ordered node sequence guarded by its own async mutex. Iteration
/// order is registration order; placement tie-breaks and login fall back
/// on it.
pub struct Roster {
    name: &'static str,
    entries: Mutex<Vec<NodeEntry>>,
}

impl Roster {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn push(&self, entry: NodeEntry) {
        self.entries.lock().await.push(entry);
    }

    /// Copy of the current entries; fan-outs operate on the snapshot so the
    /// roster lock is never held across remote calls.
    pub async fn snapshot(&self) -> Vec<NodeEntry> {
        self.entries.lock().await.clone()
    }

    /// Direct access for operations that must exclude concurrent roster
    /// mutation for their whole duration (placement, sweep).
    pub async fn lock(&self) -> MutexGuard<'_, Vec<NodeEntry>> {
        self.entries.lock().await
    }
}

/// The coordinator's three rosters.
pub struct Rosters {
    pub chat_nodes: Roster,
    pub data_ops: Roster,
    pub data_participants: Roster,
}

impl Rosters {
    pub fn new() -> Self {
        Self {
            chat_nodes: Roster::new("chat_nodes"),
            data_ops: Roster::new("data_ops"),
            data_participants: Roster::new("data_participants"),
        }
    }
}

impl Default for Rosters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_preserves_registration_order() {
        let roster = Roster::new("test");
        let a = NodeEntry::new(Uuid::new_v4(), "hostA", 1);
        let b = NodeEntry::new(Uuid::new_v4(), "hostB", 2);
        roster.push(a.clone()).await;
        roster.push(b.clone()).await;
        assert_eq!(roster.snapshot().await, vec![a, b]);
    }
}
