use std::net::SocketAddr;
use std::time::Duration;

/// Coordinator configuration, normally built from CLI flags. The timing
/// fields default to the protocol's fixed values; tests compress them.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub bind: SocketAddr,
    /// Port reported to registering nodes; 0 means "whatever we bound".
    pub public_port: u16,
    /// Period of the background liveness sweep.
    pub sweep_interval: Duration,
    /// Per-node probe timeout during a sweep.
    pub probe_timeout: Duration,
    /// Bounded wait for participant acknowledgments after doCommit.
    pub commit_wait: Duration,
    /// Timeout on outbound RPC calls.
    pub rpc_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:0".parse().expect("valid bind address"),
            public_port: 0,
            sweep_interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(2),
            commit_wait: Duration::from_millis(1_000),
            rpc_timeout: Duration::from_secs(3),
        }
    }
}
