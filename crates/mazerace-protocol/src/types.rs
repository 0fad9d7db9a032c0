//! Core protocol types for Mazerace's wire format.
//!
//! Inbound traffic is tiny: plain text command frames (`"left"`,
//! `"return-to-matchmaking"`, ...). Outbound traffic is a single
//! structured payload, [`UserState`], which tells a client which mode it
//! is in (waiting in a lobby, or playing) and everything it needs to draw.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Server-side identifier for one connected user.
///
/// Newtype over `u64` so it can't be mixed up with a [`Token`]: a user
/// keeps its `UserId` for the whole connection, while it receives a new
/// token every time it is seated in a game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// The single-glyph identifier of a player inside one game.
///
/// Tokens are drawn from a small fixed alphabet, one per lobby slot, and
/// are also what gets stamped into the rendered window. On the wire a
/// token is a one-character string: `Token('@')` becomes `"@"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Token(pub char);

impl Token {
    /// The glyph drawn for this token.
    pub fn glyph(self) -> char {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Inbound commands
// ---------------------------------------------------------------------------

/// One of the four grid directions a player can move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// All directions, in wire order.
    pub const ALL: [Direction; 4] =
        [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    /// The command word a client sends for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command decoded from one inbound text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move the player's token one cell.
    Move(Direction),
    /// Leave the current lobby or game and be matched again.
    ReturnToMatchmaking,
}

impl Command {
    /// Long form of the return-to-matchmaking command.
    pub const RETURN_TO_MATCHMAKING: &'static str = "return-to-matchmaking";
    /// Short alias accepted for older clients.
    pub const RETURN_TO_MATCHMAKING_SHORT: &'static str = "rtmm";

    /// Decodes a raw frame. Unknown or non-UTF-8 frames yield `None` and
    /// are meant to be ignored by the caller, not treated as errors.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(frame).ok()?.trim();
        match text {
            "left" => Some(Self::Move(Direction::Left)),
            "right" => Some(Self::Move(Direction::Right)),
            "up" => Some(Self::Move(Direction::Up)),
            "down" => Some(Self::Move(Direction::Down)),
            Self::RETURN_TO_MATCHMAKING | Self::RETURN_TO_MATCHMAKING_SHORT => {
                Some(Self::ReturnToMatchmaking)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

/// Occupancy summary of one lobby.
///
/// Sent to waiting members, and also the element type of the stats
/// stream (one entry per lobby).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyState {
    /// Connections currently in the lobby.
    pub players: usize,
    /// Capacity; the game starts when `players` reaches it.
    pub total: usize,
    /// Whether the lobby has been promoted to a running game.
    pub in_progress: bool,
}

/// Per-recipient view of a running game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// The recipient's own token.
    pub token: Token,
    /// Row-major text block of the recipient's window, one `\n`-terminated
    /// line per row.
    pub window: String,
    /// Every participant's token, in seating order.
    pub players: Vec<Token>,
    /// The first player to reach the end cell, once there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Token>,
    /// Milliseconds from game start until each finisher first reached
    /// the end cell.
    pub solved_times: BTreeMap<Token, u64>,
    /// Game start as Unix epoch milliseconds.
    pub game_start: u64,
}

/// Everything the server ever pushes to a player connection.
///
/// `#[serde(tag = "mode")]` with screaming-case variant names produces
/// `{"mode": "LOBBY", "lobby": {...}}` and `{"mode": "GAME", "game": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserState {
    /// The connection is waiting for its lobby to fill up.
    Lobby { lobby: LobbyState },
    /// The connection is seated in a running game.
    Game { game: GameState },
}

// =========================================================================
// Tests
// =========================================================================
