//! Matchmaking and live games for Mazerace.
//!
//! Users are grouped into fixed-size lobbies; a full lobby generates a
//! board and becomes a running game. All shared state sits behind Tokio
//! locks, always taken top-down:
//!
//! ```text
//! GameManager (RwLock) → Lobby (Mutex) → GameSession (Mutex) → User binding (Mutex)
//! ```
//!
//! # Key types
//!
//! - [`GameManager`]: finds or creates a lobby for each user, routes
//!   disconnects, prunes empty lobbies
//! - [`Lobby`]: waiting room; starts a [`GameSession`] when full
//! - [`GameSession`]: one running game plus its token → user map;
//!   serializes moves and broadcasts
//! - [`User`] / [`PlayerSession`]: a connection's outbound queue and its
//!   seat in a game
//! - [`LobbyConfig`]: token alphabet, board and window sizes, seed

mod config;
mod error;
mod lobby;
mod manager;
mod session;
mod user;

pub use config::{LobbyConfig, MAX_BOARD_SIDE};
pub use error::LobbyError;
pub use lobby::{Lobby, LobbyPhase};
pub use manager::GameManager;
pub use session::GameSession;
pub use user::{OUTBOUND_QUEUE_LEN, PlayerSession, User, UserSender};
