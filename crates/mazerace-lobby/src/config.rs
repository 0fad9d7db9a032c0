//! Lobby and game configuration.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use mazerace_maze::Point;
use mazerace_protocol::Token;
use serde::{Deserialize, Serialize};

/// Largest accepted maze side, in maze cells.
pub const MAX_BOARD_SIDE: usize = 500;

/// Settings shared by every lobby a [`GameManager`](crate::GameManager)
/// creates.
///
/// The token alphabet doubles as the lobby capacity: a lobby starts its
/// game as soon as it holds one member per token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Player tokens, assigned in join order.
    pub tokens: Vec<Token>,

    /// Maze width in maze cells. The rendered board is `2 * width + 1`
    /// characters wide.
    pub board_width: usize,

    /// Maze height in maze cells.
    pub board_height: usize,

    /// Width of the window each player sees, in characters.
    pub window_width: i32,

    /// Height of the window each player sees, in characters.
    pub window_height: i32,

    /// Base seed. Each lobby offsets it by its own id.
    pub seed: u64,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            tokens: vec![Token('@'), Token('$')],
            board_width: 10,
            board_height: 5,
            window_width: 41,
            window_height: 21,
            seed: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_nanos() as u64),
        }
    }
}

impl LobbyConfig {
    /// Returns a copy with out-of-range values repaired.
    ///
    /// An empty alphabet falls back to the default one, repeated tokens
    /// are dropped (keeping the first), zero sizes become 1, and board
    /// sides are capped at [`MAX_BOARD_SIDE`]. Every repair is logged at
    /// `warn`.
    pub fn validated(mut self) -> Self {
        if self.tokens.is_empty() {
            tracing::warn!("token alphabet is empty, using default");
            self.tokens = Self::default().tokens;
        }

        let mut seen = HashSet::new();
        let before = self.tokens.len();
        self.tokens.retain(|t| seen.insert(*t));
        if self.tokens.len() != before {
            tracing::warn!(
                removed = before - self.tokens.len(),
                "duplicate tokens removed from alphabet"
            );
        }

        if self.board_width == 0 || self.board_height == 0 {
            tracing::warn!(
                width = self.board_width,
                height = self.board_height,
                "board dimensions must be positive, clamping to 1"
            );
            self.board_width = self.board_width.max(1);
            self.board_height = self.board_height.max(1);
        }

        if self.board_width > MAX_BOARD_SIDE || self.board_height > MAX_BOARD_SIDE {
            tracing::warn!(
                width = self.board_width,
                height = self.board_height,
                max = MAX_BOARD_SIDE,
                "board dimensions too large, clamping"
            );
            self.board_width = self.board_width.min(MAX_BOARD_SIDE);
            self.board_height = self.board_height.min(MAX_BOARD_SIDE);
        }

        if self.window_width < 1 || self.window_height < 1 {
            tracing::warn!(
                width = self.window_width,
                height = self.window_height,
                "window dimensions must be positive, clamping to 1"
            );
            self.window_width = self.window_width.max(1);
            self.window_height = self.window_height.max(1);
        }

        self
    }

    /// Members needed to start a game.
    pub fn capacity(&self) -> usize {
        self.tokens.len()
    }

    pub fn window_size(&self) -> Point {
        Point::new(self.window_width, self.window_height)
    }

    /// Board seed for the lobby with the given id.
    pub fn board_seed(&self, lobby_id: u64) -> u64 {
        self.seed.wrapping_add(lobby_id)
    }
}
