//! At-least-once forwarding of chat lines to the coordinator's log
//! surface.
//!
//! Submissions from this node are serialized by one mutex, so lines for
//! any one chatroom reach the data nodes in publish order (a chatroom
//! lives on exactly one chat node at a time, so one serial stream per
//! node is single-writer order per room). A failed submission is retried
//! until the coordinator acknowledges.

use crate::rpc::CoordinatorClient;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

pub struct LogForwarder {
    coordinator: CoordinatorClient,
    submit: Mutex<()>,
    retry_delay: Duration,
}

impl LogForwarder {
    pub fn new(coordinator: CoordinatorClient, retry_delay: Duration) -> Self {
        Self {
            coordinator,
            submit: Mutex::new(()),
            retry_delay,
        }
    }

    /// Returns only after the coordinator has accepted the line.
    pub async fn forward(&self, chatroom: &str, line: &str) {
        let _order = self.submit.lock().await;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.coordinator.log_chat_message(chatroom, line).await {
                Ok(response) if response.is_ok() => return,
                Ok(response) => {
                    warn!(chatroom, attempt, message = %response.message, "log rejected, retrying");
                }
                Err(e) => {
                    warn!(chatroom, attempt, error = %e, "log submission failed, retrying");
                }
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::Response;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn forward_retries_until_acknowledged() {
        let server = MockServer::start().await;
        // two rejections, then success
        Mock::given(method("POST"))
            .and(path("/log"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Response::fail("not yet")))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/log"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Response::ok("logged")))
            .mount(&server)
            .await;

        let forwarder = LogForwarder::new(
            CoordinatorClient::new(server.uri()),
            Duration::from_millis(5),
        );
        forwarder.forward("room1", "alice >> hello").await;

        let hits = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/log")
            .count();
        assert_eq!(hits, 3);
    }
}
