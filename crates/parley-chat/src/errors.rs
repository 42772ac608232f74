use thiserror::Error;

/// Chat node bootstrap and operational failures. Remote entry points
/// convert everything to `FAIL` responses; these surface only during
/// startup.
#[derive(Debug, Error)]
pub enum ChatNodeError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("coordinator call failed: {0}")]
    Rpc(#[from] reqwest::Error),
}
