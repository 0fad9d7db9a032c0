use std::io;

use crate::ConnectionId;

/// Errors from accepting, reading, or writing connections.
///
/// Read and write failures only ever concern the one connection they name.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound.
    #[error("failed to bind listener: {0}")]
    Bind(#[source] io::Error),

    /// The listener failed to accept a TCP connection.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// The client's upgrade request was rejected or cut short.
    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("write to {conn} failed: {reason}")]
    Write { conn: ConnectionId, reason: String },

    #[error("read from {conn} failed: {reason}")]
    Read { conn: ConnectionId, reason: String },
}
