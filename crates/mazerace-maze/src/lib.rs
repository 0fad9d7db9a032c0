//! Boards and game rules for Mazerace.
//!
//! Everything in this crate is synchronous and free of shared state:
//!
//! - [`Board`]: an immutable grid of walls and spaces with one start
//!   and one end cell. Parsed from text or produced by the generator.
//! - [`Game`]: a value-type state machine over a board and a set of
//!   players. Every transition returns a new `Game`; nothing is mutated
//!   in place, so whoever holds the lock around a `Game` can publish it
//!   without ever exposing a half-applied move.
//!
//! Concurrency lives one layer up, in `mazerace-lobby`.

mod board;
mod error;
mod game;
mod generator;
mod geometry;

pub use board::{Board, Cell};
pub use error::{GameError, ParseError};
pub use game::{Game, Outcome, Player};
pub use generator::generate;
pub use geometry::{Point, Rect};
