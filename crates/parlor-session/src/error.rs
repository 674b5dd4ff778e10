//! Session error types.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    #[error("no peer connected within {0:?}")]
    AcceptTimeout(Duration),

    #[error("connect attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("no handshake from peer within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] parlor_proto::error::ProtoError),

    #[error("link closed")]
    LinkClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
