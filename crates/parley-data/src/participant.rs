//! The data node's two-phase-commit participant role.
//!
//! A participant holds the transactions currently between a YES vote and
//! the coordinator's doCommit/doAbort, enforcing per-key mutual exclusion
//! across them, and pairs each with a decision-poll task that guards
//! against a coordinator that goes silent mid-transaction.

use crate::poll::{run_decision_poll, PollConfig};
use crate::rpc::CoordinatorClient;
use crate::store::Store;
use parking_lot::Mutex;
use parley_types::{Ack, Op, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct Participant {
    store: Arc<Store>,
    coordinator: CoordinatorClient,
    poll_config: PollConfig,
    /// Transactions between canCommit=YES and doCommit/doAbort.
    txns: Mutex<HashMap<u64, Transaction>>,
    /// Companion decision-poll task per pending transaction.
    polls: Mutex<HashMap<u64, CancellationToken>>,
}

impl Participant {
    pub fn new(store: Arc<Store>, coordinator: CoordinatorClient, poll_config: PollConfig) -> Self {
        Self {
            store,
            coordinator,
            poll_config,
            txns: Mutex::new(HashMap::new()),
            polls: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub(crate) fn coordinator(&self) -> &CoordinatorClient {
        &self.coordinator
    }

    pub(crate) fn poll_config(&self) -> PollConfig {
        self.poll_config
    }

    /// Phase-one vote. NO when a CREATEUSER key already exists or when any
    /// pending transaction holds the same key; otherwise the transaction is
    /// admitted, a decision-poll task is spawned for it, and the vote is
    /// YES.
    pub fn can_commit(self: Arc<Self>, transaction: Transaction, participant_id: Uuid) -> Ack {
        {
            let mut txns = self.txns.lock();
            if transaction.op == Op::CreateUser && self.store.user_exists(&transaction.key) {
                debug!(key = %transaction.key, "vote NO: user already exists");
                return Ack::No;
            }
            if txns.values().any(|pending| pending.key == transaction.key) {
                debug!(
                    index = transaction.index,
                    key = %transaction.key,
                    "vote NO: key held by a pending transaction"
                );
                return Ack::No;
            }
            txns.insert(transaction.index, transaction.clone());
        }

        let cancel = CancellationToken::new();
        self.polls.lock().insert(transaction.index, cancel.clone());
        tokio::spawn(run_decision_poll(self, transaction, participant_id, cancel));
        Ack::Yes
    }

    /// Applies the transaction idempotently, reports `haveCommitted`
    /// best-effort, and releases the key.
    pub async fn do_commit(&self, transaction: &Transaction, participant_id: Uuid) {
        self.finish_poll(transaction.index);
        self.apply(transaction);
        if let Err(e) = self
            .coordinator
            .have_committed(transaction, participant_id)
            .await
        {
            warn!(index = transaction.index, error = %e, "haveCommitted not delivered");
        }
        self.txns.lock().remove(&transaction.index);
    }

    /// Drops the transaction without applying it. Idempotent.
    pub fn do_abort(&self, transaction: &Transaction) {
        self.finish_poll(transaction.index);
        if self.txns.lock().remove(&transaction.index).is_some() {
            info!(index = transaction.index, op = %transaction.op, "transaction aborted");
        }
    }

    /// Number of transactions still holding keys; used by tests and
    /// operator introspection.
    pub fn pending_transactions(&self) -> usize {
        self.txns.lock().len()
    }

    /// Marks the companion decision-poll task finished and removes it.
    /// Must precede the local apply so a racing poll cannot re-enter the
    /// coordinator after the transaction resolves.
    fn finish_poll(&self, index: u64) {
        if let Some(cancel) = self.polls.lock().remove(&index) {
            cancel.cancel();
        }
    }

    fn apply(&self, transaction: &Transaction) {
        match transaction.op {
            Op::CreateUser => self.store.create_user(&transaction.key, &transaction.value),
            Op::CreateChatroom => self
                .store
                .create_chatroom(&transaction.key, &transaction.value),
            Op::DeleteChatroom => self.store.delete_chatroom(&transaction.key),
            Op::LogMessage => self
                .store
                .append_chat_line(&transaction.key, &transaction.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn participant() -> (TempDir, Arc<Participant>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(Store::open(dir.path().join("files_0")).unwrap());
        let coordinator = CoordinatorClient::new("http://127.0.0.1:9");
        let participant = Arc::new(Participant::new(
            store,
            coordinator,
            PollConfig::default(),
        ));
        (dir, participant)
    }

    fn txn(index: u64, op: Op, key: &str, value: &str) -> Transaction {
        Transaction::new(index, op, key, value)
    }

    #[tokio::test]
    async fn duplicate_user_votes_no() {
        let (_dir, p) = participant();
        p.store().create_user("alice", "pw");
        let vote = Arc::clone(&p).can_commit(txn(1, Op::CreateUser, "alice", "pw2"), Uuid::new_v4());
        assert_eq!(vote, Ack::No);
        assert_eq!(p.pending_transactions(), 0);
    }

    #[tokio::test]
    async fn per_key_mutual_exclusion_spans_ops() {
        let (_dir, p) = participant();
        let id = Uuid::new_v4();
        assert_eq!(
            Arc::clone(&p).can_commit(txn(1, Op::CreateChatroom, "room1", "alice"), id),
            Ack::Yes
        );
        // same key, different op: still excluded
        assert_eq!(
            Arc::clone(&p).can_commit(txn(2, Op::DeleteChatroom, "room1", "alice"), id),
            Ack::No
        );
        // different key admits
        assert_eq!(
            Arc::clone(&p).can_commit(txn(3, Op::CreateChatroom, "room2", "alice"), id),
            Ack::Yes
        );

        p.do_abort(&txn(1, Op::CreateChatroom, "room1", "alice"));
        p.do_abort(&txn(3, Op::CreateChatroom, "room2", "alice"));
        assert_eq!(p.pending_transactions(), 0);
    }

    #[tokio::test]
    async fn abort_releases_the_key() {
        let (_dir, p) = participant();
        let id = Uuid::new_v4();
        let t = txn(1, Op::CreateUser, "alice", "pw");
        assert_eq!(Arc::clone(&p).can_commit(t.clone(), id), Ack::Yes);
        p.do_abort(&t);
        assert_eq!(Arc::clone(&p).can_commit(txn(2, Op::CreateUser, "alice", "pw"), id), Ack::Yes);
        p.do_abort(&txn(2, Op::CreateUser, "alice", "pw"));
        assert!(!p.store().user_exists("alice"));
    }

    #[tokio::test]
    async fn commit_applies_even_without_a_prior_vote() {
        // doCommit is idempotent and does not require the transaction to be
        // pending (a participant may see a retried doCommit after its map
        // entry is gone).
        let (_dir, p) = participant();
        let t = txn(9, Op::CreateUser, "alice", "pw");
        p.do_commit(&t, Uuid::new_v4()).await;
        p.do_commit(&t, Uuid::new_v4()).await;
        assert!(p.store().verify_user("alice", "pw"));
    }
}
