//! The per-transaction decision-poll task.
//!
//! Spawned when a participant votes YES, this task is the sole guard
//! against a coordinator that crashes between collecting votes and
//! delivering the decision. It sleeps one poll interval, short-circuits if
//! the transaction resolved in the meantime, and otherwise asks the
//! coordinator for its decision and applies it locally.
//!
//! An undecided (`Na`) reply or an unreachable coordinator re-arms the
//! timer, up to a bounded budget; when the budget runs out the participant
//! aborts unilaterally so the per-key lock is not held forever.

use crate::participant::Participant;
use parley_types::{Ack, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Sleep between polls.
    pub interval: Duration,
    /// Polls before giving up and aborting locally.
    pub budget: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1_000),
            budget: 10,
        }
    }
}

pub(crate) async fn run_decision_poll(
    participant: Arc<Participant>,
    transaction: Transaction,
    participant_id: Uuid,
    cancel: CancellationToken,
) {
    let config = participant.poll_config();
    for round in 0..config.budget {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(index = transaction.index, "decision poll finished before firing");
                return;
            }
            _ = tokio::time::sleep(config.interval) => {}
        }

        match participant.coordinator().get_decision(&transaction).await {
            Ok(Ack::Yes) => {
                debug!(index = transaction.index, "poll learned decision YES");
                participant.do_commit(&transaction, participant_id).await;
                return;
            }
            Ok(Ack::No) => {
                debug!(index = transaction.index, "poll learned decision NO");
                participant.do_abort(&transaction);
                return;
            }
            Ok(Ack::Na) => {
                debug!(index = transaction.index, round, "decision not yet available");
            }
            Err(e) => {
                debug!(index = transaction.index, round, error = %e, "coordinator unreachable");
            }
        }
    }

    warn!(
        index = transaction.index,
        key = %transaction.key,
        "decision poll budget exhausted, aborting unilaterally"
    );
    participant.do_abort(&transaction);
}
