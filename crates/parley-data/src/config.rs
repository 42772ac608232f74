use crate::poll::PollConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Data node configuration, normally built from CLI flags.
#[derive(Debug, Clone)]
pub struct DataNodeConfig {
    /// Bind address for the DataOps surface.
    pub ops_bind: SocketAddr,
    /// Bind address for the DataParticipant surface.
    pub participant_bind: SocketAddr,
    /// Base URL of the coordinator, e.g. `http://127.0.0.1:7000`.
    pub coordinator_url: String,
    /// Directory under which the node's `files_<id>/` tree lives.
    pub data_dir: PathBuf,
    /// The `<id>` in `files_<id>/`.
    pub node_id: String,
    /// Hostname reported to the coordinator at registration.
    pub advertise_host: String,
    pub poll: PollConfig,
}

impl Default for DataNodeConfig {
    fn default() -> Self {
        Self {
            ops_bind: "127.0.0.1:0".parse().expect("valid bind address"),
            participant_bind: "127.0.0.1:0".parse().expect("valid bind address"),
            coordinator_url: "http://127.0.0.1:7000".to_string(),
            data_dir: PathBuf::from("."),
            node_id: "0".to_string(),
            advertise_host: "127.0.0.1".to_string(),
            poll: PollConfig::default(),
        }
    }
}

impl DataNodeConfig {
    /// Root of the durable file tree: `<data_dir>/files_<id>/`.
    pub fn store_root(&self) -> PathBuf {
        self.data_dir.join(format!("files_{}", self.node_id))
    }
}
