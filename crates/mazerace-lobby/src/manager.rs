//! Game manager: the registry of every open lobby.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mazerace_protocol::LobbyState;
use tokio::sync::RwLock;

use crate::{Lobby, LobbyConfig, LobbyError, User};

/// Places users into lobbies and cleans up after them.
///
/// Every tracked user is in exactly one lobby, and a lobby that loses its
/// last member is removed in the same call. Lobby ids come from a
/// per-manager counter so a fixed config seed gives reproducible boards.
#[derive(Debug)]
pub struct GameManager {
    config: Arc<LobbyConfig>,
    next_lobby_id: AtomicU64,
    lobbies: RwLock<Vec<Arc<Lobby>>>,
}

impl GameManager {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config: Arc::new(config.validated()),
            next_lobby_id: AtomicU64::new(1),
            lobbies: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    /// Puts `user` in the oldest lobby that still has room, or in a new
    /// lobby when none does.
    ///
    /// Holds the registry write lock for the whole search so two joiners
    /// can't both decide to open a new lobby.
    pub async fn join(&self, user: Arc<User>) -> Result<Arc<Lobby>, LobbyError> {
        let mut lobbies = self.lobbies.write().await;
        for lobby in lobbies.iter() {
            if lobby.add(Arc::clone(&user)).await? {
                return Ok(Arc::clone(lobby));
            }
        }

        let id = self.next_lobby_id.fetch_add(1, Ordering::Relaxed);
        let lobby = Arc::new(Lobby::new(id, Arc::clone(&self.config)));
        if !lobby.add(user).await? {
            return Err(LobbyError::InvalidState(format!(
                "new lobby {id} refused its first user"
            )));
        }
        lobbies.push(Arc::clone(&lobby));
        tracing::info!(lobby = id, lobbies = lobbies.len(), "lobby created");
        Ok(lobby)
    }

    /// Removes `user` from whichever lobby holds it.
    ///
    /// An emptied lobby is removed. Otherwise the remaining members are
    /// sent the updated lobby or game state. Fails if no lobby knows the
    /// user.
    pub async fn drop_user(&self, user: &User) -> Result<(), LobbyError> {
        let mut lobbies = self.lobbies.write().await;
        for index in 0..lobbies.len() {
            let remaining = lobbies[index].drop_user(user).await?;
            match remaining {
                None => continue,
                Some(0) => {
                    let lobby = lobbies.remove(index);
                    tracing::info!(lobby = lobby.id(), lobbies = lobbies.len(), "lobby removed");
                }
                Some(_) => lobbies[index].broadcast().await,
            }
            return Ok(());
        }

        tracing::error!(user = %user.id(), "user is not in any lobby");
        Err(LobbyError::UserNotFound(user.id()))
    }

    /// Occupancy of every lobby, oldest first.
    pub async fn state(&self) -> Vec<LobbyState> {
        let lobbies = self.lobbies.read().await;
        let mut states = Vec::with_capacity(lobbies.len());
        for lobby in lobbies.iter() {
            states.push(lobby.state().await);
        }
        states
    }

    /// Number of open lobbies.
    pub async fn lobby_count(&self) -> usize {
        self.lobbies.read().await.len()
    }
}
