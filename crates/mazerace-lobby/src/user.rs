//! The lobby layer's view of one connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mazerace_protocol::{Direction, Token, UserId, UserState};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, Notify, mpsc};

use crate::{GameSession, LobbyError};

/// Channel for delivering outbound payloads to a connection's writer.
pub type UserSender = mpsc::Sender<UserState>;

/// Payloads a connection may have waiting before it counts as stalled.
pub const OUTBOUND_QUEUE_LEN: usize = 64;

/// A connected user as seen by lobbies and sessions.
///
/// Holds the outbound queue and, once a game starts, the user's binding
/// to that game. The binding lock is a leaf: nothing else is acquired
/// while it is held.
///
/// A full queue means the client has stopped reading. The user is then
/// marked stalled, no further payloads are queued, and
/// [`delivery_closed`](Self::delivery_closed) resolves so the connection
/// is torn down.
#[derive(Debug)]
pub struct User {
    id: UserId,
    outbound: UserSender,
    stalled: AtomicBool,
    stall: Notify,
    player: Mutex<Option<PlayerSession>>,
}

impl User {
    pub fn new(id: UserId, outbound: UserSender) -> Self {
        Self {
            id,
            outbound,
            stalled: AtomicBool::new(false),
            stall: Notify::new(),
            player: Mutex::new(None),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    /// Queues `state` for delivery without waiting. Returns `false` if the
    /// writer has gone away or the queue is full.
    pub fn notify(&self, state: UserState) -> bool {
        if self.stalled.load(Ordering::Acquire) {
            return false;
        }
        match self.outbound.try_send(state) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                if !self.stalled.swap(true, Ordering::AcqRel) {
                    tracing::warn!(user = %self.id, "outbound queue full, disconnecting");
                    self.stall.notify_one();
                }
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(user = %self.id, "outbound queue closed, dropping update");
                false
            }
        }
    }

    /// Resolves once this connection can no longer be delivered to: the
    /// writer has stopped, or the queue overflowed.
    pub async fn delivery_closed(&self) {
        if self.stalled.load(Ordering::Acquire) {
            return;
        }
        tokio::select! {
            () = self.outbound.closed() => {}
            () = self.stall.notified() => {}
        }
    }

    /// The game this user is currently playing, if any.
    pub async fn player_session(&self) -> Option<PlayerSession> {
        self.player.lock().await.clone()
    }

    pub(crate) async fn bind_game(&self, session: PlayerSession) {
        *self.player.lock().await = Some(session);
    }

    pub(crate) async fn clear_game(&self) {
        self.player.lock().await.take();
    }
}

/// A user's seat in one running game.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    token: Token,
    session: Arc<GameSession>,
}

impl PlayerSession {
    pub(crate) fn new(token: Token, session: Arc<GameSession>) -> Self {
        Self { token, session }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn session(&self) -> &Arc<GameSession> {
        &self.session
    }

    /// Moves this player and broadcasts the result.
    pub async fn step(&self, dir: Direction) -> Result<(), LobbyError> {
        self.session.step(self.token, dir).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mazerace_protocol::LobbyState;

    use super::*;

    fn lobby_state() -> UserState {
        UserState::Lobby {
            lobby: LobbyState {
                players: 1,
                total: 2,
                in_progress: false,
            },
        }
    }

    #[tokio::test]
    async fn test_notify_queues_payload() {
        let (tx, mut rx) = mpsc::channel(OUTBOUND_QUEUE_LEN);
        let user = User::new(UserId(1), tx);
        assert!(user.notify(lobby_state()));
        assert_eq!(rx.recv().await, Some(lobby_state()));
    }

    #[tokio::test]
    async fn test_notify_after_writer_gone_reports_failure() {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_LEN);
        let user = User::new(UserId(1), tx);
        drop(rx);
        assert!(!user.notify(lobby_state()));
        user.delivery_closed().await;
    }

    #[tokio::test]
    async fn test_new_user_has_no_game() {
        let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE_LEN);
        let user = User::new(UserId(9), tx);
        assert_eq!(user.id(), UserId(9));
        assert!(user.player_session().await.is_none());
    }

    #[tokio::test]
    async fn test_undrained_queue_stalls_user() {
        let (tx, mut rx) = mpsc::channel(4);
        let user = User::new(UserId(2), tx);
        for _ in 0..4 {
            assert!(user.notify(lobby_state()));
        }

        assert!(!user.notify(lobby_state()));
        tokio::time::timeout(Duration::from_secs(1), user.delivery_closed())
            .await
            .expect("a full queue should end delivery");

        // Draining afterwards does not revive the user.
        while rx.try_recv().is_ok() {}
        assert!(!user.notify(lobby_state()));
        user.delivery_closed().await;
    }

    #[tokio::test]
    async fn test_stall_wakes_a_waiting_reader() {
        let (tx, _rx) = mpsc::channel(1);
        let user = Arc::new(User::new(UserId(3), tx));
        let waiter = tokio::spawn({
            let user = Arc::clone(&user);
            async move { user.delivery_closed().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(user.notify(lobby_state()));
        assert!(!user.notify(lobby_state()));
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }
}
