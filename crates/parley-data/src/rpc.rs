//! Thin client for the coordinator surfaces a data node calls.

use crate::errors::DataNodeError;
use parley_types::api::{
    GetDecisionRequest, HaveCommittedRequest, RegisterDataNodeRequest, RegisterResponse,
    ServerTimeResponse,
};
use parley_types::{Ack, Response, Transaction};
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone)]
pub struct CoordinatorClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoordinatorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Asks the coordinator what it decided for `transaction`. `Na` means
    /// the decision table has no entry (not yet decided, or already
    /// concluded and cleared).
    pub async fn get_decision(&self, transaction: &Transaction) -> Result<Ack, DataNodeError> {
        let ack = self
            .http
            .post(format!("{}/txn/decision", self.base_url))
            .json(&GetDecisionRequest {
                transaction: transaction.clone(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(ack)
    }

    /// Reports a locally applied commit back to the coordinator.
    pub async fn have_committed(
        &self,
        transaction: &Transaction,
        participant_id: Uuid,
    ) -> Result<Response, DataNodeError> {
        let response = self
            .http
            .post(format!("{}/txn/committed", self.base_url))
            .json(&HaveCommittedRequest {
                transaction: transaction.clone(),
                participant_id,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn register_data_node(
        &self,
        request: &RegisterDataNodeRequest,
    ) -> Result<RegisterResponse, DataNodeError> {
        let response = self
            .http
            .post(format!("{}/register/data", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn server_time(&self) -> Result<ServerTimeResponse, DataNodeError> {
        let response = self
            .http
            .get(format!("{}/time", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}
