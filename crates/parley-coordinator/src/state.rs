use crate::config::CoordinatorConfig;
use crate::roster::Rosters;
use crate::rpc::{ChatNodeClient, DataOpsClient, ParticipantClient};
use crate::sweep::{LivenessProbe, Sweeper};
use crate::twopc::TwoPhaseDriver;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared state behind every coordinator handler.
pub struct CoordinatorState {
    pub config: CoordinatorConfig,
    /// Port reported in registration responses.
    pub public_port: u16,
    pub rosters: Arc<Rosters>,
    pub driver: TwoPhaseDriver,
    pub sweeper: Arc<Sweeper>,
    pub data_ops: DataOpsClient,
    pub chat: ChatNodeClient,
    /// Single-flight guard for `reestablishChatroom`.
    pub reestablish: Mutex<()>,
}

impl CoordinatorState {
    pub fn new(config: CoordinatorConfig, public_port: u16) -> Arc<Self> {
        let rosters = Arc::new(Rosters::new());
        let driver = TwoPhaseDriver::new(
            Arc::clone(&rosters),
            ParticipantClient::new(config.rpc_timeout),
            config.commit_wait,
        );
        let sweeper = Arc::new(Sweeper::new(
            Arc::clone(&rosters),
            LivenessProbe::new(config.probe_timeout),
        ));
        let data_ops = DataOpsClient::new(config.rpc_timeout);
        let chat = ChatNodeClient::new(config.rpc_timeout);
        Arc::new(Self {
            config,
            public_port,
            rosters,
            driver,
            sweeper,
            data_ops,
            chat,
            reestablish: Mutex::new(()),
        })
    }
}

pub type AppState = Arc<CoordinatorState>;
