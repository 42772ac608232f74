use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("coordinator call failed: {0}")]
    Rpc(#[from] reqwest::Error),

    #[error("stream i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("chat node rejected the subscription handshake")]
    HandshakeRejected,

    #[error("stream closed during the subscription handshake")]
    HandshakeEof,
}
