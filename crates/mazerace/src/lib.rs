//! # Mazerace
//!
//! Real-time multiplayer maze race server.
//!
//! Players connect over WebSocket, are grouped into fixed-size lobbies,
//! and race through a shared generated maze once their lobby fills. Every
//! move is applied under the game's lock and broadcast to all players in
//! that game. A second endpoint streams lobby occupancy for dashboards.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mazerace::prelude::*;
//!
//! # async fn start() -> Result<(), MazeraceError> {
//! let server = MazeraceServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;
mod stats;

pub use error::MazeraceError;
pub use server::{DEFAULT_STATS_PATH, DEFAULT_USER_PATH, MazeraceServer, MazeraceServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{
        DEFAULT_STATS_PATH, DEFAULT_USER_PATH, MazeraceError, MazeraceServer,
        MazeraceServerBuilder,
    };
    pub use mazerace_lobby::LobbyConfig;
    pub use mazerace_protocol::{GameState, LobbyState, Token, UserState};
}
