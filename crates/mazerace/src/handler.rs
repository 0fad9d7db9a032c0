//! Per-connection handler: matchmaking, lobby wait, and game play.
//!
//! Each player connection gets its own Tokio task running a
//! [`ConnectionSession`], plus a writer task that drains the user's
//! outbound queue onto the socket. The session moves through three phases:
//!   1. Matchmaking: join a lobby through the game manager
//!   2. Lobby: wait for the lobby to fill; `return-to-matchmaking` rejoins
//!   3. Game: forward moves to the game session until the player leaves
//!
//! A read failure, a clean close, a failed write (seen as the outbound
//! queue closing) or a full outbound queue ends the session. The user is then dropped from its
//! lobby, which re-broadcasts to whoever is left.

use std::sync::Arc;
use std::time::Duration;

use mazerace_lobby::{Lobby, OUTBOUND_QUEUE_LEN, PlayerSession, User};
use mazerace_protocol::{Codec, Command, UserState};
use mazerace_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::MazeraceError;
use crate::server::ServerState;

/// Upper bound on the closing handshake, which can hang when the client
/// has stopped reading.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Where a connection is in its lifecycle.
enum Phase {
    /// Not in any lobby. Resolved immediately by joining one.
    Matchmaking,
    /// Waiting in a lobby that hasn't started.
    Lobby(Arc<Lobby>),
    /// Seated in a running game.
    Game(PlayerSession),
}

struct ConnectionSession<C: Codec> {
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    user: Arc<User>,
    phase: Phase,
}

/// Handles a single player connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), MazeraceError> {
    let conn = Arc::new(conn);
    let (outbound, queue) = mpsc::channel(OUTBOUND_QUEUE_LEN);
    let user = Arc::new(User::new(state.next_user_id(), outbound));
    tracing::debug!(conn_id = %conn.id(), user = %user.id(), "player connected");

    let writer = tokio::spawn(write_outbound(
        Arc::clone(&conn),
        Arc::clone(&state),
        queue,
    ));

    let mut session = ConnectionSession {
        conn: Arc::clone(&conn),
        state: Arc::clone(&state),
        user: Arc::clone(&user),
        phase: Phase::Matchmaking,
    };
    let result = session.run().await;
    session.leave().await;

    writer.abort();
    let _ = writer.await;
    match tokio::time::timeout(CLOSE_TIMEOUT, conn.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(user = %user.id(), error = %e, "close failed"),
        Err(_) => tracing::debug!(user = %user.id(), "close timed out"),
    }
    tracing::debug!(user = %user.id(), "player disconnected");
    result
}

/// Drains the user's outbound queue onto the socket, one payload at a
/// time. Returning drops the queue, which the reader sees as
/// [`User::delivery_closed`].
async fn write_outbound<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut queue: mpsc::Receiver<UserState>,
) {
    while let Some(payload) = queue.recv().await {
        let text = match state.codec.encode(&payload) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(conn_id = %conn.id(), error = %e, "failed to encode payload");
                continue;
            }
        };
        if let Err(e) = conn.send(&text).await {
            tracing::warn!(conn_id = %conn.id(), error = %e, "delivery failed");
            return;
        }
    }
}

impl<C: Codec> ConnectionSession<C> {
    async fn run(&mut self) -> Result<(), MazeraceError> {
        loop {
            match &self.phase {
                Phase::Matchmaking => self.matchmake().await?,
                Phase::Lobby(_) => {
                    if self.check_promotion().await {
                        continue;
                    }
                    let Some(frame) = self.next_frame().await? else {
                        return Ok(());
                    };
                    // The lobby may have started while we were reading.
                    if self.check_promotion().await {
                        self.handle_game_frame(&frame).await?;
                    } else {
                        self.handle_lobby_frame(&frame).await?;
                    }
                }
                Phase::Game(_) => {
                    let Some(frame) = self.next_frame().await? else {
                        return Ok(());
                    };
                    self.handle_game_frame(&frame).await?;
                }
            }
        }
    }

    async fn matchmake(&mut self) -> Result<(), MazeraceError> {
        let lobby = self.state.games.join(Arc::clone(&self.user)).await?;
        tracing::debug!(user = %self.user.id(), lobby = lobby.id(), "entered lobby");
        self.phase = Phase::Lobby(Arc::clone(&lobby));
        lobby.broadcast().await;
        Ok(())
    }

    /// Switches to game mode if a game session has seated this user.
    async fn check_promotion(&mut self) -> bool {
        match self.user.player_session().await {
            Some(seat) => {
                tracing::debug!(user = %self.user.id(), token = %seat.token(), "entered game");
                self.phase = Phase::Game(seat);
                true
            }
            None => false,
        }
    }

    /// Reads the next frame, or `None` once the client has gone or the
    /// writer has stopped delivering.
    async fn next_frame(&self) -> Result<Option<Vec<u8>>, MazeraceError> {
        tokio::select! {
            frame = self.conn.recv() => Ok(frame?),
            () = self.user.delivery_closed() => {
                tracing::debug!(user = %self.user.id(), "outbound delivery stopped");
                Ok(None)
            }
        }
    }

    async fn handle_lobby_frame(&mut self, frame: &[u8]) -> Result<(), MazeraceError> {
        match Command::parse(frame) {
            Some(Command::ReturnToMatchmaking) => self.rejoin().await,
            Some(Command::Move(dir)) => {
                tracing::debug!(user = %self.user.id(), %dir, "move while waiting, ignoring");
                Ok(())
            }
            None => {
                tracing::debug!(user = %self.user.id(), "unrecognized frame, ignoring");
                Ok(())
            }
        }
    }

    async fn handle_game_frame(&mut self, frame: &[u8]) -> Result<(), MazeraceError> {
        match Command::parse(frame) {
            Some(Command::Move(dir)) => {
                if let Phase::Game(seat) = &self.phase {
                    seat.step(dir).await?;
                }
                Ok(())
            }
            Some(Command::ReturnToMatchmaking) => self.rejoin().await,
            None => {
                tracing::debug!(user = %self.user.id(), "unrecognized frame, ignoring");
                Ok(())
            }
        }
    }

    /// Leaves the current lobby or game and goes back to matchmaking.
    async fn rejoin(&mut self) -> Result<(), MazeraceError> {
        let user = self.user.id();
        match std::mem::replace(&mut self.phase, Phase::Matchmaking) {
            Phase::Matchmaking => return Ok(()),
            Phase::Lobby(lobby) => tracing::debug!(%user, lobby = lobby.id(), "leaving lobby"),
            Phase::Game(seat) => tracing::debug!(%user, token = %seat.token(), "leaving game"),
        }
        self.state.games.drop_user(&self.user).await?;
        Ok(())
    }

    /// Drops the user from its lobby, if it is in one.
    async fn leave(&mut self) {
        if let Err(e) = self.rejoin().await {
            tracing::error!(user = %self.user.id(), error = %e, "cleanup failed");
        }
    }
}
