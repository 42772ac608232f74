//! Typed client for the coordinator's user-facing surface.

use crate::errors::ClientError;
use parley_types::api::{
    ChatroomListResponse, ChatroomResponse, CreateChatroomRequest, DeleteChatroomRequest,
    LoginRequest, ReestablishChatroomRequest, RegisterUserRequest, ServerTimeResponse,
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
            .timeout(Duration::from_secs(10))
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

    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Response, ClientError> {
        let response = self
            .http
            .post(format!("{}/users/register", self.base_url))
            .json(&RegisterUserRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Response, ClientError> {
        let response = self
            .http
            .post(format!("{}/users/login", self.base_url))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn list_chatrooms(&self) -> Result<ChatroomListResponse, ClientError> {
        let response = self
            .http
            .get(format!("{}/chatrooms", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn create_chatroom(
        &self,
        name: &str,
        username: &str,
    ) -> Result<ChatroomResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/chatrooms", self.base_url))
            .json(&CreateChatroomRequest {
                name: name.to_string(),
                username: username.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn get_chatroom(&self, name: &str) -> Result<ChatroomResponse, ClientError> {
        let response = self
            .http
            .get(format!("{}/chatrooms/{}", self.base_url, name))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn delete_chatroom(
        &self,
        name: &str,
        username: &str,
        password: &str,
    ) -> Result<Response, ClientError> {
        let response = self
            .http
            .post(format!("{}/chatrooms/delete", self.base_url))
            .json(&DeleteChatroomRequest {
                name: name.to_string(),
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    /// Called when a message stream closes unexpectedly: asks the
    /// coordinator to re-place the room on a surviving chat node.
    pub async fn reestablish_chatroom(
        &self,
        name: &str,
        username: &str,
    ) -> Result<ChatroomResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/chatrooms/reestablish", self.base_url))
            .json(&ReestablishChatroomRequest {
                name: name.to_string(),
                username: username.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn server_time(&self) -> Result<ServerTimeResponse, ClientError> {
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
