use thiserror::Error;

/// Failure modes of chatroom placement.
///
/// `RoomExists` renders the load-bearing sentinel string: it is how
/// `reestablishChatroom` tells "another client already re-placed the room"
/// apart from an unrecoverable failure.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("A chatroom with this name already exists")]
    RoomExists,

    #[error("No chat nodes are available")]
    NoChatNodes,

    #[error("chat node failed during placement: {0}")]
    NodeFailed(String),
}

/// Coordinator-side operation failures. Every remote entry point converts
/// these into `FAIL`-valued responses; they never escape as transport
/// errors.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("transaction {0} aborted")]
    TransactionAborted(u64),

    #[error("No data nodes are available")]
    NoDataNodes,

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("remote call failed: {0}")]
    Rpc(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
