//! The game state machine.
//!
//! [`Game`] is a plain value. Adding, dropping and moving players all take
//! `&self` and return the next `Game`, so a holder that swaps the value in
//! under a lock never publishes a partially applied transition.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mazerace_protocol::{Direction, Token};

use crate::{Board, GameError, Point, Rect};

/// A token and where it stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub token: Token,
    pub pos: Point,
}

/// Whether somebody has reached the end cell yet.
///
/// Moves are still accepted once a game is finished, but the winner is
/// fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Finished { winner: Token },
}

#[derive(Debug, Clone)]
pub struct Game {
    board: Arc<Board>,
    players: Vec<Player>,
    window_size: Point,
    outcome: Outcome,
    started_at: SystemTime,
    solved_times: BTreeMap<Token, Duration>,
}

impl Game {
    /// A new game with no players, started now.
    pub fn new(board: Arc<Board>, window_size: Point) -> Self {
        Self::new_at(board, window_size, SystemTime::now())
    }

    /// A new game with no players and an explicit start time.
    pub fn new_at(board: Arc<Board>, window_size: Point, started_at: SystemTime) -> Self {
        Self {
            board,
            players: Vec::new(),
            window_size,
            outcome: Outcome::InProgress,
            started_at,
            solved_times: BTreeMap::new(),
        }
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    /// Players in seating order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.players.iter().map(|p| p.token).collect()
    }

    pub fn player(&self, token: Token) -> Option<&Player> {
        self.players.iter().find(|p| p.token == token)
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn winner(&self) -> Option<Token> {
        match self.outcome {
            Outcome::InProgress => None,
            Outcome::Finished { winner } => Some(winner),
        }
    }

    /// Start time as milliseconds since the Unix epoch.
    pub fn start_millis(&self) -> u64 {
        self.started_at
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }

    /// Time from start to first arrival at the end cell, per finisher.
    pub fn solved_times(&self) -> &BTreeMap<Token, Duration> {
        &self.solved_times
    }

    /// Seats `token` on the start cell.
    pub fn with_player(&self, token: Token) -> Result<Self, GameError> {
        if self.player(token).is_some() {
            return Err(GameError::DuplicateToken(token));
        }
        let mut next = self.clone();
        next.players.push(Player {
            token,
            pos: self.board.start(),
        });
        Ok(next)
    }

    /// Removes `token`. Its recorded finish time, and the winner if it
    /// was the winner, are kept.
    pub fn without_player(&self, token: Token) -> Result<Self, GameError> {
        let index = self.index_of(token)?;
        let mut next = self.clone();
        next.players.remove(index);
        Ok(next)
    }

    /// Moves `token` one cell in `dir`, timing any arrival against the
    /// wall clock.
    pub fn step(&self, token: Token, dir: Direction) -> Result<Self, GameError> {
        self.step_at(token, dir, SystemTime::now())
    }

    /// Moves `token` one cell in `dir`. A move into a wall or off the
    /// board leaves the game unchanged.
    pub fn step_at(
        &self,
        token: Token,
        dir: Direction,
        now: SystemTime,
    ) -> Result<Self, GameError> {
        let index = self.index_of(token)?;
        let proposed = self.players[index].pos.translate(dir);
        if !self.board.is_path(proposed) {
            return Ok(self.clone());
        }

        let mut next = self.clone();
        next.players[index].pos = proposed;

        if proposed == self.board.end() && !next.solved_times.contains_key(&token) {
            let elapsed = now.duration_since(self.started_at).unwrap_or_default();
            next.solved_times.insert(token, elapsed);
            if next.outcome == Outcome::InProgress {
                next.outcome = Outcome::Finished { winner: token };
            }
        }
        Ok(next)
    }

    /// Renders the window around `token`.
    ///
    /// Every player inside the window is drawn over the board, then the
    /// requester is drawn again so it is never hidden by someone sharing
    /// its cell. Each row ends in `\n`.
    pub fn window(&self, token: Token) -> Result<String, GameError> {
        let me = self.players[self.index_of(token)?];
        let rect = self
            .board
            .window_rect(Rect::from_center_and_size(me.pos, self.window_size));
        let mut grid = self.board.slice(rect);

        let mut stamp = |p: &Player| {
            if rect.contains(p.pos) {
                let at = p.pos.rel(rect.top_left);
                if let Some(cell) = grid
                    .get_mut(at.y as usize)
                    .and_then(|row| row.get_mut(at.x as usize))
                {
                    *cell = p.token.glyph();
                }
            }
        };
        self.players.iter().for_each(&mut stamp);
        stamp(&me);

        let mut out = String::with_capacity(grid.len() * (grid.first().map_or(0, Vec::len) + 1));
        for row in grid {
            out.extend(row);
            out.push('\n');
        }
        Ok(out)
    }

    fn index_of(&self, token: Token) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.token == token)
            .ok_or(GameError::UnknownToken(token))
    }
}
