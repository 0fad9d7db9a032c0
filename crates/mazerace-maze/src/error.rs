//! Error types for boards and games.

use mazerace_protocol::Token;

use crate::Point;

/// Why a board description was rejected.
///
/// Generated and hand-written boards share this contract: a caller that
/// gets a `ParseError` must not build a game on top of it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("board has no rows")]
    Empty,

    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("illegal character {ch:?} at {at}")]
    IllegalChar { ch: char, at: Point },

    #[error("start marker already at {first}, found another at {second}")]
    DuplicateStart { first: Point, second: Point },

    #[error("end marker already at {first}, found another at {second}")]
    DuplicateEnd { first: Point, second: Point },

    #[error("start marker not found")]
    MissingStart,

    #[error("end marker not found")]
    MissingEnd,
}

/// Invariant violations on a [`Game`](crate::Game).
///
/// These mean the token bookkeeping above the game has already gone
/// wrong; they are not retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("player {0} is not in the game")]
    UnknownToken(Token),

    #[error("player {0} is already in the game")]
    DuplicateToken(Token),
}
