//! Unified error type for the Mazerace server.

use mazerace_lobby::LobbyError;
use mazerace_protocol::ProtocolError;
use mazerace_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert errors from
/// the transport, protocol, and lobby layers.
#[derive(Debug, thiserror::Error)]
pub enum MazeraceError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A payload could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Lobby bookkeeping failed or a board could not be generated.
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}
