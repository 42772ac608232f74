//! Thin stubs for the remote surfaces the coordinator calls. Rosters hold
//! addresses only; each call builds its URL from the entry it is given.

use crate::roster::NodeEntry;
use parley_types::api::{
    CanCommitRequest, ChatroomDataResponse, ChatroomExistsRequest, ChatroomListResponse,
    CreateRoomRequest, DeleteRoomRequest, DoAbortRequest, DoCommitRequest, UserExistsRequest,
    VerifyOwnershipRequest, VerifyUserRequest,
};
use parley_types::{Ack, Response, Transaction};
use std::time::Duration;

fn default_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Stub for the DataOps surface (read queries).
#[derive(Clone)]
pub struct DataOpsClient {
    http: reqwest::Client,
}

impl DataOpsClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: default_client(timeout),
        }
    }

    async fn post<Req: serde::Serialize>(
        &self,
        node: &NodeEntry,
        route: &str,
        body: &Req,
    ) -> Result<Response, reqwest::Error> {
        self.http
            .post(format!("{}{}", node.base_url(), route))
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn verify_user(
        &self,
        node: &NodeEntry,
        username: &str,
        password: &str,
    ) -> Result<Response, reqwest::Error> {
        self.post(
            node,
            "/users/verify",
            &VerifyUserRequest {
                username: username.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    pub async fn user_exists(
        &self,
        node: &NodeEntry,
        username: &str,
    ) -> Result<Response, reqwest::Error> {
        self.post(
            node,
            "/users/exists",
            &UserExistsRequest {
                username: username.to_string(),
            },
        )
        .await
    }

    pub async fn chatroom_exists(
        &self,
        node: &NodeEntry,
        chatroom: &str,
    ) -> Result<Response, reqwest::Error> {
        self.post(
            node,
            "/chatrooms/exists",
            &ChatroomExistsRequest {
                chatroom: chatroom.to_string(),
            },
        )
        .await
    }

    pub async fn verify_owner(
        &self,
        node: &NodeEntry,
        chatroom: &str,
        username: &str,
    ) -> Result<Response, reqwest::Error> {
        self.post(
            node,
            "/chatrooms/verify-owner",
            &VerifyOwnershipRequest {
                chatroom: chatroom.to_string(),
                username: username.to_string(),
            },
        )
        .await
    }
}

/// Stub for the DataParticipant surface (two-phase commit).
#[derive(Clone)]
pub struct ParticipantClient {
    http: reqwest::Client,
}

impl ParticipantClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: default_client(timeout),
        }
    }

    pub async fn can_commit(
        &self,
        node: &NodeEntry,
        transaction: &Transaction,
    ) -> Result<Ack, reqwest::Error> {
        self.http
            .post(format!("{}/txn/can-commit", node.base_url()))
            .json(&CanCommitRequest {
                transaction: transaction.clone(),
                participant_id: node.id,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn do_commit(
        &self,
        node: &NodeEntry,
        transaction: &Transaction,
    ) -> Result<Response, reqwest::Error> {
        self.http
            .post(format!("{}/txn/do-commit", node.base_url()))
            .json(&DoCommitRequest {
                transaction: transaction.clone(),
                participant_id: node.id,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn do_abort(
        &self,
        node: &NodeEntry,
        transaction: &Transaction,
    ) -> Result<Response, reqwest::Error> {
        self.http
            .post(format!("{}/txn/do-abort", node.base_url()))
            .json(&DoAbortRequest {
                transaction: transaction.clone(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Stub for the chat node's management surface.
#[derive(Clone)]
pub struct ChatNodeClient {
    http: reqwest::Client,
}

impl ChatNodeClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: default_client(timeout),
        }
    }

    pub async fn rooms(&self, node: &NodeEntry) -> Result<ChatroomListResponse, reqwest::Error> {
        self.http
            .get(format!("{}/rooms", node.base_url()))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn load(&self, node: &NodeEntry) -> Result<ChatroomDataResponse, reqwest::Error> {
        self.http
            .get(format!("{}/load", node.base_url()))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn create_room(
        &self,
        node: &NodeEntry,
        name: &str,
    ) -> Result<Response, reqwest::Error> {
        self.http
            .post(format!("{}/rooms", node.base_url()))
            .json(&CreateRoomRequest {
                name: name.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn delete_room(
        &self,
        node: &NodeEntry,
        name: &str,
    ) -> Result<Response, reqwest::Error> {
        self.http
            .post(format!("{}/rooms/delete", node.base_url()))
            .json(&DeleteRoomRequest {
                name: name.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}
