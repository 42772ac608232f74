use thiserror::Error;

/// Errors surfaced while bootstrapping or operating a data node.
///
/// Remote entry points never return these to callers; per the propagation
/// policy, transport and durable-write failures are logged and converted to
/// `FAIL` responses or swallowed. These variants cover setup paths where
/// failing loudly is correct.
#[derive(Debug, Error)]
pub enum DataNodeError {
    #[error("i/o error on the durable store: {0}")]
    Io(#[from] std::io::Error),

    #[error("coordinator call failed: {0}")]
    Rpc(#[from] reqwest::Error),
}
