//! The two-phase-commit driver and its bookkeeping tables.
//!
//! Two compound operations are exposed: [`TwoPhaseDriver::generic_commit`]
//! and [`TwoPhaseDriver::commit_with`], the explicit-step variant that runs
//! a non-transactional side effect between the vote aggregate and the
//! commit fan-out (chatroom create/delete must attach a chat-node action
//! atomically to the transaction).
//!
//! Decision-table writes strictly precede the fan-out that depends on
//! them, so a participant's decision poll can never observe a stale value
//! for a transaction whose fan-out is in flight.

use crate::errors::CoordinatorError;
use crate::roster::{NodeEntry, Rosters};
use crate::rpc::ParticipantClient;
use futures::future::join_all;
use parking_lot::Mutex;
use parley_types::{Ack, Op, Transaction};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// `transaction index → decision`. An absent entry reads as `Na`.
#[derive(Default)]
pub struct DecisionTable {
    entries: Mutex<HashMap<u64, Ack>>,
}

impl DecisionTable {
    pub fn set(&self, index: u64, decision: Ack) {
        self.entries.lock().insert(index, decision);
    }

    pub fn get(&self, index: u64) -> Ack {
        self.entries.lock().get(&index).copied().unwrap_or(Ack::Na)
    }

    pub fn clear(&self, index: u64) {
        self.entries.lock().remove(&index);
    }
}

struct WaitEntry {
    remaining: usize,
    notify: Arc<Notify>,
}

/// `transaction index → (remaining participant count, wake handle)`.
/// Registered once per doCommit fan-out; each `haveCommitted` decrements,
/// and the wake handle fires when the count reaches zero.
#[derive(Default)]
pub struct CommitWaitTable {
    entries: Mutex<HashMap<u64, WaitEntry>>,
}

impl CommitWaitTable {
    pub fn register(&self, index: u64, remaining: usize) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.entries.lock().insert(
            index,
            WaitEntry {
                remaining,
                notify: Arc::clone(&notify),
            },
        );
        notify
    }

    /// Records one `haveCommitted`. Returns false when no wait is pending
    /// for `index` (late ack after the bounded wait expired).
    pub fn have_committed(&self, index: u64) -> bool {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(&index) else {
            return false;
        };
        entry.remaining = entry.remaining.saturating_sub(1);
        if entry.remaining == 0 {
            entry.notify.notify_one();
            entries.remove(&index);
        }
        true
    }

    pub fn remove(&self, index: u64) {
        self.entries.lock().remove(&index);
    }
}

pub struct TwoPhaseDriver {
    rosters: Arc<Rosters>,
    rpc: ParticipantClient,
    decisions: DecisionTable,
    waits: CommitWaitTable,
    next_index: AtomicU64,
    commit_wait: Duration,
}

impl TwoPhaseDriver {
    pub fn new(rosters: Arc<Rosters>, rpc: ParticipantClient, commit_wait: Duration) -> Self {
        Self {
            rosters,
            rpc,
            decisions: DecisionTable::default(),
            waits: CommitWaitTable::default(),
            next_index: AtomicU64::new(1),
            commit_wait,
        }
    }

    /// Allocates the next transaction; indices are unique for the lifetime
    /// of this coordinator.
    pub fn transaction(&self, op: Op, key: impl Into<String>, value: impl Into<String>) -> Transaction {
        Transaction::new(self.next_index.fetch_add(1, Ordering::Relaxed), op, key, value)
    }

    /// Decision lookup for polling participants.
    pub fn decision_for(&self, index: u64) -> Ack {
        self.decisions.get(index)
    }

    /// `haveCommitted` from a participant.
    pub fn record_have_committed(&self, index: u64, participant: Uuid) {
        if self.waits.have_committed(index) {
            debug!(index, %participant, "haveCommitted recorded");
        } else {
            debug!(index, %participant, "haveCommitted after wait expired");
        }
    }

    /// Runs the full protocol with no side effect between the phases.
    pub async fn generic_commit(&self, transaction: Transaction) -> Result<(), CoordinatorError> {
        self.commit_with(transaction, || async { Ok(()) }).await
    }

    /// The explicit-step variant: canCommit phase, then `side_effect`, then
    /// the doCommit fan-out. A side-effect failure is a forced NO: every
    /// participant that voted receives doAbort and the error is returned.
    pub async fn commit_with<T, F, Fut>(
        &self,
        transaction: Transaction,
        side_effect: F,
    ) -> Result<T, CoordinatorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoordinatorError>>,
    {
        let participants = self.rosters.data_participants.snapshot().await;
        if participants.is_empty() {
            return Err(CoordinatorError::NoDataNodes);
        }

        self.decisions.set(transaction.index, Ack::Na);

        // canCommit phase: parallel fan-out, joined; a failed call or a
        // failed join counts as a NO vote.
        let votes = join_all(participants.iter().map(|node| {
            let rpc = self.rpc.clone();
            let node = node.clone();
            let t = transaction.clone();
            tokio::spawn(async move { rpc.can_commit(&node, &t).await })
        }))
        .await;
        let all_yes = votes
            .iter()
            .all(|vote| matches!(vote, Ok(Ok(Ack::Yes))));

        if !all_yes {
            info!(
                index = transaction.index,
                op = %transaction.op,
                key = %transaction.key,
                "aborting: not every participant voted YES"
            );
            self.abort(&transaction, &participants);
            return Err(CoordinatorError::TransactionAborted(transaction.index));
        }

        let value = match side_effect().await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    index = transaction.index,
                    error = %e,
                    "side effect failed between phases, forcing abort"
                );
                self.abort(&transaction, &participants);
                return Err(e);
            }
        };

        // doCommit phase: decision first, then the fan-out that reads it.
        self.decisions.set(transaction.index, Ack::Yes);
        let wake = self.waits.register(transaction.index, participants.len());
        for node in participants.iter().cloned() {
            let rpc = self.rpc.clone();
            let t = transaction.clone();
            tokio::spawn(async move {
                if let Err(e) = rpc.do_commit(&node, &t).await {
                    warn!(index = t.index, node = %node, error = %e, "doCommit not delivered");
                }
            });
        }
        if tokio::time::timeout(self.commit_wait, wake.notified())
            .await
            .is_err()
        {
            debug!(
                index = transaction.index,
                "doCommit wait expired before every participant acknowledged"
            );
        }
        self.waits.remove(transaction.index);
        self.decisions.clear(transaction.index);
        Ok(value)
    }

    /// NO decision plus a fire-and-forget doAbort fan-out; no join wait.
    fn abort(&self, transaction: &Transaction, participants: &[NodeEntry]) {
        self.decisions.set(transaction.index, Ack::No);
        for node in participants.iter().cloned() {
            let rpc = self.rpc.clone();
            let t = transaction.clone();
            tokio::spawn(async move {
                if let Err(e) = rpc.do_abort(&node, &t).await {
                    debug!(index = t.index, node = %node, error = %e, "doAbort not delivered");
                }
            });
        }
        self.decisions.clear(transaction.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::Response;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn decision_table_defaults_to_na() {
        let table = DecisionTable::default();
        assert_eq!(table.get(42), Ack::Na);
        table.set(42, Ack::Yes);
        assert_eq!(table.get(42), Ack::Yes);
        table.clear(42);
        assert_eq!(table.get(42), Ack::Na);
    }

    #[tokio::test]
    async fn commit_wait_fires_when_count_reaches_zero() {
        let table = CommitWaitTable::default();
        let wake = table.register(7, 2);
        assert!(table.have_committed(7));
        assert!(table.have_committed(7));
        // the stored permit makes this return immediately
        tokio::time::timeout(Duration::from_millis(100), wake.notified())
            .await
            .expect("wake handle should be signaled");
        assert!(!table.have_committed(7), "entry removed at zero");
    }

    async fn participant_server(vote: Ack) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/txn/can-commit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vote))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/txn/do-commit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Response::ok("committed")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/txn/do-abort"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Response::ok("aborted")))
            .mount(&server)
            .await;
        server
    }

    fn entry_for(server: &MockServer) -> NodeEntry {
        NodeEntry::new(
            Uuid::new_v4(),
            server.address().ip().to_string(),
            server.address().port(),
        )
    }

    fn driver(rosters: Arc<Rosters>) -> TwoPhaseDriver {
        TwoPhaseDriver::new(
            rosters,
            ParticipantClient::new(Duration::from_secs(1)),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn unanimous_yes_commits() {
        let a = participant_server(Ack::Yes).await;
        let b = participant_server(Ack::Yes).await;
        let rosters = Arc::new(Rosters::new());
        rosters.data_participants.push(entry_for(&a)).await;
        rosters.data_participants.push(entry_for(&b)).await;

        let driver = driver(rosters);
        let t = driver.transaction(Op::CreateUser, "alice", "pw");
        let index = t.index;
        driver.generic_commit(t).await.expect("commit succeeds");
        assert_eq!(driver.decision_for(index), Ack::Na, "decision cleared");
    }

    #[tokio::test]
    async fn a_single_no_vote_aborts_everywhere() {
        let a = participant_server(Ack::Yes).await;
        let b = participant_server(Ack::No).await;
        let rosters = Arc::new(Rosters::new());
        rosters.data_participants.push(entry_for(&a)).await;
        rosters.data_participants.push(entry_for(&b)).await;

        let driver = driver(rosters);
        let t = driver.transaction(Op::CreateUser, "alice", "pw");
        let err = driver.generic_commit(t).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::TransactionAborted(_)));

        // the fire-and-forget doAbort fan-out reaches both participants
        tokio::time::sleep(Duration::from_millis(200)).await;
        async fn aborts_at(server: &MockServer) -> usize {
            server
                .received_requests()
                .await
                .unwrap()
                .iter()
                .filter(|r| r.url.path() == "/txn/do-abort")
                .count()
        }
        assert_eq!(aborts_at(&a).await, 1);
        assert_eq!(aborts_at(&b).await, 1);
    }

    #[tokio::test]
    async fn unreachable_participant_counts_as_no() {
        let a = participant_server(Ack::Yes).await;
        let rosters = Arc::new(Rosters::new());
        rosters.data_participants.push(entry_for(&a)).await;
        rosters
            .data_participants
            .push(NodeEntry::new(Uuid::new_v4(), "127.0.0.1", 9))
            .await;

        let driver = driver(rosters);
        let t = driver.transaction(Op::CreateChatroom, "room1", "alice");
        let err = driver.generic_commit(t).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::TransactionAborted(_)));
    }

    #[tokio::test]
    async fn empty_roster_fails_outright() {
        let driver = driver(Arc::new(Rosters::new()));
        let t = driver.transaction(Op::CreateUser, "alice", "pw");
        let err = driver.generic_commit(t).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NoDataNodes));
    }

    #[tokio::test]
    async fn side_effect_failure_forces_abort() {
        let a = participant_server(Ack::Yes).await;
        let rosters = Arc::new(Rosters::new());
        rosters.data_participants.push(entry_for(&a)).await;

        let driver = driver(rosters);
        let t = driver.transaction(Op::CreateChatroom, "room1", "alice");
        let err = driver
            .commit_with(t, || async {
                Err::<(), _>(CoordinatorError::Placement(
                    crate::errors::PlacementError::NoChatNodes,
                ))
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::Placement(crate::errors::PlacementError::NoChatNodes)
        ));

        tokio::time::sleep(Duration::from_millis(200)).await;
        let requests = a.received_requests().await.unwrap();
        assert!(requests.iter().any(|r| r.url.path() == "/txn/do-abort"));
        assert!(!requests.iter().any(|r| r.url.path() == "/txn/do-commit"));
    }
}
