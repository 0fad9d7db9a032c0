//! A live game and the users playing it.
//!
//! [`GameSession`] is the one place a running [`Game`] changes. Each
//! operation takes the session lock, swaps in the next `Game` value, and
//! keeps the token → user map in step with the game's player list. Moves
//! broadcast before the lock is released, so every player is sent the
//! same snapshot and snapshots go out in the order the moves were applied.

use std::collections::BTreeMap;
use std::sync::Arc;

use mazerace_maze::{Game, GameError};
use mazerace_protocol::{Direction, GameState, Token, UserId, UserState};
use tokio::sync::Mutex;

use crate::{LobbyError, PlayerSession, User};

#[derive(Debug)]
pub struct GameSession {
    lobby_id: u64,
    inner: Mutex<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    game: Game,
    users: BTreeMap<Token, Arc<User>>,
}

impl GameSession {
    pub fn new(lobby_id: u64, game: Game) -> Arc<Self> {
        Arc::new(Self {
            lobby_id,
            inner: Mutex::new(SessionInner {
                game,
                users: BTreeMap::new(),
            }),
        })
    }

    /// Seats `user` as `token` and binds the user to this session.
    ///
    /// Does not broadcast; the lobby broadcasts once every member is
    /// seated.
    pub async fn add_player(
        self: &Arc<Self>,
        token: Token,
        user: Arc<User>,
    ) -> Result<(), LobbyError> {
        let mut inner = self.inner.lock().await;
        inner.game = inner.game.with_player(token)?;
        inner.users.insert(token, Arc::clone(&user));
        user.bind_game(PlayerSession::new(token, Arc::clone(self)))
            .await;
        tracing::debug!(lobby = self.lobby_id, user = %user.id(), %token, "player seated");
        Ok(())
    }

    /// Removes `user` from the game and returns the token it held.
    ///
    /// Does not broadcast; the caller decides whether anyone is left to
    /// tell.
    pub async fn drop_player(&self, user: &User) -> Result<Token, LobbyError> {
        let mut inner = self.inner.lock().await;
        let token = inner
            .users
            .iter()
            .find(|(_, u)| u.id() == user.id())
            .map(|(t, _)| *t)
            .ok_or(LobbyError::UserNotFound(user.id()))?;

        inner.game = inner.game.without_player(token)?;
        inner.users.remove(&token);
        tracing::info!(
            lobby = self.lobby_id,
            user = %user.id(),
            %token,
            remaining = inner.users.len(),
            "player left game"
        );
        Ok(token)
    }

    /// Applies one move and broadcasts the new state.
    pub async fn step(&self, token: Token, dir: Direction) -> Result<(), LobbyError> {
        let mut inner = self.inner.lock().await;
        let next = inner.game.step(token, dir).map_err(|e| {
            tracing::error!(lobby = self.lobby_id, %token, error = %e, "move from unknown token");
            e
        })?;

        if let (None, Some(winner)) = (inner.game.winner(), next.winner()) {
            tracing::info!(lobby = self.lobby_id, %winner, "game won");
        }
        inner.game = next;
        self.broadcast_locked(&inner);
        Ok(())
    }

    /// Sends every player its own view of the current game.
    pub async fn broadcast(&self) {
        let inner = self.inner.lock().await;
        self.broadcast_locked(&inner);
    }

    /// A copy of the current game.
    pub async fn game(&self) -> Game {
        self.inner.lock().await.game.clone()
    }

    /// Tokens with a mapped user, which are always the game's tokens.
    pub async fn tokens(&self) -> Vec<Token> {
        self.inner.lock().await.users.keys().copied().collect()
    }

    /// The token `user` plays as, if it is in this game.
    pub async fn token_of(&self, user: UserId) -> Option<Token> {
        let inner = self.inner.lock().await;
        inner
            .users
            .iter()
            .find(|(_, u)| u.id() == user)
            .map(|(t, _)| *t)
    }

    fn broadcast_locked(&self, inner: &SessionInner) {
        for player in inner.game.players() {
            let Some(user) = inner.users.get(&player.token) else {
                tracing::error!(lobby = self.lobby_id, token = %player.token, "player has no user");
                continue;
            };
            match game_state(&inner.game, player.token) {
                Ok(game) => {
                    user.notify(UserState::Game { game });
                }
                Err(e) => {
                    tracing::error!(lobby = self.lobby_id, error = %e, "failed to render game state");
                }
            }
        }
    }
}

/// The payload sent to the player holding `token`.
fn game_state(game: &Game, token: Token) -> Result<GameState, GameError> {
    Ok(GameState {
        token,
        window: game.window(token)?,
        players: game.tokens(),
        winner: game.winner(),
        solved_times: game
            .solved_times()
            .iter()
            .map(|(t, d)| (*t, d.as_millis() as u64))
            .collect(),
        game_start: game.start_millis(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use mazerace_maze::{Board, Point};
    use tokio::sync::mpsc;

    use crate::OUTBOUND_QUEUE_LEN;

    use super::*;

    const A: Token = Token('@');
    const B: Token = Token('$');

    fn corridor_session() -> Arc<GameSession> {
        let board = Arc::new(Board::parse("#####\n#S E#\n#####").unwrap());
        GameSession::new(1, Game::new_at(board, Point::new(5, 3), UNIX_EPOCH))
    }

    fn user(id: u64) -> (Arc<User>, mpsc::Receiver<UserState>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_LEN);
        (Arc::new(User::new(UserId(id), tx)), rx)
    }

    fn expect_game(state: UserState) -> GameState {
        match state {
            UserState::Game { game } => game,
            other => panic!("expected game payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_player_binds_user() {
        let session = corridor_session();
        let (u1, _rx) = user(1);
        session.add_player(A, Arc::clone(&u1)).await.unwrap();

        let seat = u1.player_session().await.unwrap();
        assert_eq!(seat.token(), A);
        assert!(Arc::ptr_eq(seat.session(), &session));
        assert_eq!(session.tokens().await, vec![A]);
    }

    #[tokio::test]
    async fn test_add_player_rejects_taken_token() {
        let session = corridor_session();
        let (u1, _rx1) = user(1);
        let (u2, _rx2) = user(2);
        session.add_player(A, u1).await.unwrap();
        let err = session.add_player(A, u2).await.unwrap_err();
        assert!(matches!(err, LobbyError::Game(GameError::DuplicateToken(t)) if t == A));
    }

    #[tokio::test]
    async fn test_step_broadcasts_to_every_player() {
        let session = corridor_session();
        let (u1, mut rx1) = user(1);
        let (u2, mut rx2) = user(2);
        session.add_player(A, u1).await.unwrap();
        session.add_player(B, u2).await.unwrap();

        session.step(A, Direction::Right).await.unwrap();

        let a = expect_game(rx1.try_recv().unwrap());
        let b = expect_game(rx2.try_recv().unwrap());
        assert_eq!(a.token, A);
        assert_eq!(b.token, B);
        assert_eq!(a.players, vec![A, B]);
        assert_eq!(a.window, "#####\n#$@E#\n#####\n");
        assert_eq!(b.window, "####\n#$@E\n####\n");
    }

    #[tokio::test]
    async fn test_step_records_winner_in_payload() {
        let session = corridor_session();
        let (u1, mut rx1) = user(1);
        session.add_player(A, u1).await.unwrap();

        session.step(A, Direction::Right).await.unwrap();
        session.step(A, Direction::Right).await.unwrap();

        let _ = rx1.try_recv().unwrap();
        let last = expect_game(rx1.try_recv().unwrap());
        assert_eq!(last.winner, Some(A));
        assert!(last.solved_times.contains_key(&A));
        assert_eq!(last.game_start, 0);
    }

    #[tokio::test]
    async fn test_drop_player_keeps_map_and_game_in_step() {
        let session = corridor_session();
        let (u1, _rx1) = user(1);
        let (u2, _rx2) = user(2);
        session.add_player(A, u1).await.unwrap();
        session.add_player(B, Arc::clone(&u2)).await.unwrap();

        assert_eq!(session.drop_player(&u2).await.unwrap(), B);
        assert_eq!(session.tokens().await, vec![A]);
        assert_eq!(session.game().await.tokens(), vec![A]);
        assert_eq!(session.token_of(UserId(2)).await, None);
    }

    #[tokio::test]
    async fn test_drop_unknown_user_fails() {
        let session = corridor_session();
        let (stranger, _rx) = user(5);
        let err = session.drop_player(&stranger).await.unwrap_err();
        assert!(matches!(err, LobbyError::UserNotFound(UserId(5))));
    }

    #[tokio::test]
    async fn test_step_unknown_token_fails() {
        let session = corridor_session();
        let err = session.step(A, Direction::Right).await.unwrap_err();
        assert!(matches!(err, LobbyError::Game(GameError::UnknownToken(t)) if t == A));
    }

    #[test]
    fn test_game_state_reports_millis() {
        let board = Arc::new(Board::parse("###\nSE#\n###").unwrap());
        let game = Game::new_at(board, Point::new(3, 3), UNIX_EPOCH + Duration::from_secs(2))
            .with_player(A)
            .unwrap()
            .step_at(A, Direction::Right, UNIX_EPOCH + Duration::from_millis(3250))
            .unwrap();
        let state = game_state(&game, A).unwrap();
        assert_eq!(state.solved_times[&A], 1250);
        assert_eq!(state.game_start, 2000);
        assert_eq!(state.winner, Some(A));
    }
}
