//! In-process cluster harness: one coordinator, N data nodes on tempdir
//! file trees, N chat nodes, all on ephemeral ports.

use parley_chat::{ChatNodeConfig, ChatNodeHandle};
use parley_client::CoordinatorClient;
use parley_coordinator::{CoordinatorConfig, CoordinatorHandle};
use parley_data::{DataNodeConfig, DataNodeHandle, PollConfig};
use std::time::Duration;
use tempfile::TempDir;

pub struct Cluster {
    pub coordinator: CoordinatorHandle,
    pub data_nodes: Vec<DataNodeHandle>,
    pub chat_nodes: Vec<ChatNodeHandle>,
    pub client: CoordinatorClient,
    pub coordinator_url: String,
    _data_dir: TempDir,
}

impl Cluster {
    /// Spawns the cluster leaves-first: coordinator, then data nodes, then
    /// chat nodes. Registration order fixes roster iteration order.
    pub async fn start(data_nodes: usize, chat_nodes: usize) -> Cluster {
        let data_dir = TempDir::new().expect("tempdir");

        let coordinator = parley_coordinator::spawn(CoordinatorConfig {
            // the periodic sweep stays out of the way; re-establishment
            // triggers its own eager pass
            sweep_interval: Duration::from_secs(600),
            ..CoordinatorConfig::default()
        })
        .await
        .expect("coordinator");
        let coordinator_url = format!("http://127.0.0.1:{}", coordinator.addr.port());

        let mut data = Vec::new();
        for i in 0..data_nodes {
            data.push(
                parley_data::spawn(DataNodeConfig {
                    coordinator_url: coordinator_url.clone(),
                    data_dir: data_dir.path().to_path_buf(),
                    node_id: i.to_string(),
                    poll: PollConfig {
                        interval: Duration::from_millis(200),
                        budget: 25,
                    },
                    ..DataNodeConfig::default()
                })
                .await
                .expect("data node"),
            );
        }

        let mut chat = Vec::new();
        for _ in 0..chat_nodes {
            chat.push(
                parley_chat::spawn(ChatNodeConfig {
                    coordinator_url: coordinator_url.clone(),
                    log_retry_delay: Duration::from_millis(50),
                    ..ChatNodeConfig::default()
                })
                .await
                .expect("chat node"),
            );
        }

        let client = CoordinatorClient::new(coordinator_url.clone());
        Cluster {
            coordinator,
            data_nodes: data,
            chat_nodes: chat,
            client,
            coordinator_url,
            _data_dir: data_dir,
        }
    }

    /// Contents of one data node's log for `room`, empty if the file is
    /// missing.
    pub fn chat_log(&self, data_node: usize, room: &str) -> String {
        let path = self.data_nodes[data_node]
            .store_root
            .join("chatlogs")
            .join(format!("{}.txt", room));
        std::fs::read_to_string(path).unwrap_or_default()
    }

    /// Contents of one data node's chatrooms.txt.
    pub fn chatrooms_file(&self, data_node: usize) -> String {
        let path = self.data_nodes[data_node].store_root.join("chatrooms.txt");
        std::fs::read_to_string(path).unwrap_or_default()
    }
}
