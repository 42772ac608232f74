use std::net::SocketAddr;
use std::time::Duration;

/// Chat node configuration, normally built from CLI flags.
#[derive(Debug, Clone)]
pub struct ChatNodeConfig {
    /// Bind address for the HTTP surfaces (management + user ops).
    pub rpc_bind: SocketAddr,
    /// Bind address for the raw TCP message streams.
    pub stream_bind: SocketAddr,
    /// Base URL of the coordinator.
    pub coordinator_url: String,
    /// Hostname other processes should use to reach this node.
    pub advertise_host: String,
    /// Delay between chat-log submission retries.
    pub log_retry_delay: Duration,
}

impl Default for ChatNodeConfig {
    fn default() -> Self {
        Self {
            rpc_bind: "127.0.0.1:0".parse().expect("valid bind address"),
            stream_bind: "127.0.0.1:0".parse().expect("valid bind address"),
            coordinator_url: "http://127.0.0.1:7000".to_string(),
            advertise_host: "127.0.0.1".to_string(),
            log_retry_delay: Duration::from_millis(100),
        }
    }
}
