//! DecisionOps surface: the two calls participants make back into the
//! coordinator during 2PC.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use parley_types::api::{GetDecisionRequest, HaveCommittedRequest};
use parley_types::{Ack, Response};

/// Decision lookup for a polling participant; `Na` when the table holds
/// no entry for the transaction.
pub async fn get_decision(
    State(state): State<AppState>,
    Json(req): Json<GetDecisionRequest>,
) -> Json<Ack> {
    Json(state.driver.decision_for(req.transaction.index))
}

/// A participant reporting that it applied a commit locally.
pub async fn have_committed(
    State(state): State<AppState>,
    Json(req): Json<HaveCommittedRequest>,
) -> Json<Response> {
    state
        .driver
        .record_have_committed(req.transaction.index, req.participant_id);
    Json(Response::ok("recorded"))
}
