//! Error types for the lobby layer.

use mazerace_maze::{GameError, ParseError};
use mazerace_protocol::UserId;

/// Errors from lobby, session, and manager operations.
///
/// None of these are caused by player input. They mean either that a
/// board could not be built or that membership bookkeeping is broken.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// A game transition was asked about a token it does not know.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The generated board failed validation.
    #[error("board generation failed: {0}")]
    Board(#[from] ParseError),

    /// The user is not a member of any lobby or game it was looked up in.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The operation doesn't fit the lobby's current phase.
    #[error("invalid lobby state for this operation: {0}")]
    InvalidState(String),
}
