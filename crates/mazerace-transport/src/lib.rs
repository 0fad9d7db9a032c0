//! Framed duplex connections for the Mazerace server.
//!
//! The server never touches sockets directly. It accepts through a
//! [`Transport`] and then exchanges whole text frames over a
//! [`Connection`]: commands come in, JSON state goes out.
//!
//! The `websocket` feature (on by default) provides the only
//! implementation, built on `tokio-tungstenite`.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    DEFAULT_HANDSHAKE_TIMEOUT, PendingConnection, WebSocketConnection, WebSocketTransport,
};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one accepted connection, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next id. Ids start at 1 and are never reused.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of new connections.
pub trait Transport: Send + Sync + 'static {
    type Pending: Handshake<Connection = Self::Connection, Error = Self::Error>;
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client. Nothing is read from it yet; the
    /// caller runs [`Handshake::complete`], usually on its own task.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;
}

/// An accepted client whose handshake has not run yet.
pub trait Handshake: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    async fn complete(self) -> Result<Self::Connection, Self::Error>;
}

/// One client connection carrying whole frames both ways.
///
/// [`recv`](Connection::recv) and [`send`](Connection::send) lock separate
/// halves, so a reader parked on one task leaves the connection writable
/// from another. Writers are serialized among themselves.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Next text or binary payload, or `Ok(None)` after a clean close.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;

    /// Path of the upgrade request, such as `/user-socket/`.
    fn path(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_increase() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert!(b > a);
        assert!(a.get() >= 1);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "conn-7");
    }

    #[test]
    fn test_error_names_connection() {
        let err = TransportError::Write {
            conn: ConnectionId(3),
            reason: "broken pipe".into(),
        };
        assert_eq!(err.to_string(), "write to conn-3 failed: broken pipe");
    }
}
