//! Thin client for the coordinator surfaces a chat node calls.

use crate::errors::ChatNodeError;
use parley_types::api::{
    LogMessageRequest, RegisterChatNodeRequest, RegisterResponse, ServerTimeResponse,
};
use parley_types::Response;
use std::time::Duration;

#[derive(Clone)]
pub struct CoordinatorClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoordinatorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn register_chat_node(
        &self,
        request: &RegisterChatNodeRequest,
    ) -> Result<RegisterResponse, ChatNodeError> {
        let response = self
            .http
            .post(format!("{}/register/chat", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn log_chat_message(
        &self,
        chatroom: &str,
        line: &str,
    ) -> Result<Response, ChatNodeError> {
        let response = self
            .http
            .post(format!("{}/log", self.base_url))
            .json(&LogMessageRequest {
                chatroom: chatroom.to_string(),
                line: line.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn server_time(&self) -> Result<ServerTimeResponse, ChatNodeError> {
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
