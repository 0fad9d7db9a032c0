//! Wire types and payload codec for Mazerace.
//!
//! Inbound frames are plain commands (`left`, `return-to-matchmaking`)
//! parsed by [`Command::parse`]. Outbound frames are [`UserState`]
//! payloads, or a list of [`LobbyState`] on the stats stream, serialized
//! through a [`Codec`]. Nothing here knows about sockets or lobbies.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Command, Direction, GameState, LobbyState, Token, UserId, UserState,
};
