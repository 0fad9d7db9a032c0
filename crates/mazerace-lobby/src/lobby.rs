//! Lobby: a fixed-size waiting room that turns into a game when full.

use std::sync::Arc;

use mazerace_maze::{Board, Game};
use mazerace_protocol::{LobbyState, UserState};
use tokio::sync::Mutex;

use crate::{GameSession, LobbyConfig, LobbyError, User};

/// Whether a lobby is still filling up or already playing.
#[derive(Debug, Clone)]
pub enum LobbyPhase {
    Waiting,
    Active(Arc<GameSession>),
}

impl LobbyPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

#[derive(Debug)]
pub struct Lobby {
    id: u64,
    config: Arc<LobbyConfig>,
    inner: Mutex<LobbyInner>,
}

#[derive(Debug)]
struct LobbyInner {
    users: Vec<Arc<User>>,
    phase: LobbyPhase,
}

impl Lobby {
    pub fn new(id: u64, config: Arc<LobbyConfig>) -> Self {
        Self {
            id,
            config,
            inner: Mutex::new(LobbyInner {
                users: Vec::new(),
                phase: LobbyPhase::Waiting,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Adds `user` to the lobby.
    ///
    /// Returns `Ok(false)` when the lobby has already started and the
    /// caller has to look elsewhere. When `user` fills the last slot, the
    /// game is started before this returns: a board is generated, and
    /// every member is seated with the next token from the alphabet. If
    /// the board can't be generated the user is not admitted.
    pub async fn add(&self, user: Arc<User>) -> Result<bool, LobbyError> {
        let mut inner = self.inner.lock().await;
        let capacity = self.config.capacity();
        if inner.phase.is_active() || inner.users.len() >= capacity {
            return Ok(false);
        }

        if inner.users.len() + 1 < capacity {
            inner.users.push(user);
            tracing::info!(
                lobby = self.id,
                players = inner.users.len(),
                capacity,
                "user joined lobby"
            );
            return Ok(true);
        }

        let board = Board::generate(
            self.config.board_seed(self.id),
            self.config.board_width,
            self.config.board_height,
        )
        .map_err(|e| {
            tracing::error!(lobby = self.id, error = %e, "generated board is invalid");
            e
        })?;
        inner.users.push(user);

        let game = Game::new(Arc::new(board), self.config.window_size());
        let session = GameSession::new(self.id, game);
        for (member, token) in inner.users.iter().zip(&self.config.tokens) {
            session.add_player(*token, Arc::clone(member)).await?;
        }
        inner.phase = LobbyPhase::Active(session);
        tracing::info!(lobby = self.id, players = inner.users.len(), "game started");
        Ok(true)
    }

    /// Removes `user` from the lobby, and from its game if one is running.
    ///
    /// Returns `None` if the user isn't a member, otherwise the number of
    /// members left.
    pub async fn drop_user(&self, user: &User) -> Result<Option<usize>, LobbyError> {
        let mut inner = self.inner.lock().await;
        let Some(index) = inner.users.iter().position(|u| u.id() == user.id()) else {
            return Ok(None);
        };
        // Leave the game first so a failure keeps lobby and game in step.
        if let LobbyPhase::Active(session) = &inner.phase {
            session.drop_player(user).await?;
            user.clear_game().await;
        }
        inner.users.remove(index);
        tracing::info!(
            lobby = self.id,
            user = %user.id(),
            remaining = inner.users.len(),
            "user left lobby"
        );
        Ok(Some(inner.users.len()))
    }

    /// Sends every member the current state: the game view once a game is
    /// running, the occupancy summary before that.
    pub async fn broadcast(&self) {
        let inner = self.inner.lock().await;
        match &inner.phase {
            LobbyPhase::Active(session) => session.broadcast().await,
            LobbyPhase::Waiting => {
                let lobby = self.summary(&inner);
                for user in &inner.users {
                    user.notify(UserState::Lobby { lobby });
                }
            }
        }
    }

    /// Occupancy summary.
    pub async fn state(&self) -> LobbyState {
        let inner = self.inner.lock().await;
        self.summary(&inner)
    }

    /// The running game, if the lobby has started.
    pub async fn game_session(&self) -> Option<Arc<GameSession>> {
        match &self.inner.lock().await.phase {
            LobbyPhase::Active(session) => Some(Arc::clone(session)),
            LobbyPhase::Waiting => None,
        }
    }

    pub async fn phase(&self) -> LobbyPhase {
        self.inner.lock().await.phase.clone()
    }

    fn summary(&self, inner: &LobbyInner) -> LobbyState {
        LobbyState {
            players: inner.users.len(),
            total: self.config.capacity(),
            in_progress: inner.phase.is_active(),
        }
    }
}
