//! Liveness sweep over the rosters.
//!
//! A background task probes every roster entry's `/healthz` periodically
//! and evicts entries that fail to answer. `reestablishChatroom` also
//! triggers an eager pass so a presumed-dead chat node is evicted before
//! re-placement. Eviction is best-effort membership, not transactional:
//! participants dropped mid-2PC unblock through their decision poll.

use crate::roster::{Roster, Rosters};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct LivenessProbe {
    http: reqwest::Client,
}

impl LivenessProbe {
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { http }
    }

    pub async fn is_alive(&self, base_url: &str) -> bool {
        match self.http.get(format!("{}/healthz", base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

pub struct Sweeper {
    rosters: Arc<Rosters>,
    probe: LivenessProbe,
}

impl Sweeper {
    pub fn new(rosters: Arc<Rosters>, probe: LivenessProbe) -> Self {
        Self { rosters, probe }
    }

    /// One pass over all three rosters. Each roster is swept under its own
    /// lock so no placement or fan-out snapshot can interleave with the
    /// eviction.
    pub async fn sweep_once(&self) {
        self.sweep_roster(&self.rosters.chat_nodes).await;
        self.sweep_roster(&self.rosters.data_ops).await;
        self.sweep_roster(&self.rosters.data_participants).await;
    }

    async fn sweep_roster(&self, roster: &Roster) {
        let mut entries = roster.lock().await;
        let before = entries.len();
        let mut live = Vec::with_capacity(before);
        for entry in entries.drain(..) {
            if self.probe.is_alive(&entry.base_url()).await {
                live.push(entry);
            } else {
                warn!(roster = roster.name(), node = %entry, "evicting unreachable node");
            }
        }
        *entries = live;
        if entries.len() != before {
            info!(
                roster = roster.name(),
                evicted = before - entries.len(),
                remaining = entries.len(),
                "sweep evicted nodes"
            );
        }
    }

    /// Endless sweep loop; honors the service shutdown token.
    pub async fn run(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("liveness sweep stopped");
                    return;
                }
                _ = tokio::time::sleep(interval) => {}
            }
            self.sweep_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::NodeEntry;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sweep_keeps_healthy_nodes_and_evicts_dead_ones() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let rosters = Arc::new(Rosters::new());
        let healthy = NodeEntry::new(
            Uuid::new_v4(),
            server.address().ip().to_string(),
            server.address().port(),
        );
        // port 9 (discard) has no listener
        let dead = NodeEntry::new(Uuid::new_v4(), "127.0.0.1", 9);
        rosters.chat_nodes.push(healthy.clone()).await;
        rosters.chat_nodes.push(dead).await;

        let sweeper = Sweeper::new(
            Arc::clone(&rosters),
            LivenessProbe::new(Duration::from_millis(500)),
        );
        sweeper.sweep_once().await;

        assert_eq!(rosters.chat_nodes.snapshot().await, vec![healthy]);
    }
}
