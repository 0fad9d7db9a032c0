//! `MazeraceServer` builder and accept loop.
//!
//! This is the entry point for running a Mazerace server. It ties the
//! layers together: transport → protocol → lobby. Each accepted
//! connection is routed by its upgrade path to either a player session
//! or the stats stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mazerace_lobby::{GameManager, LobbyConfig};
use mazerace_protocol::{Codec, JsonCodec, UserId};
use mazerace_transport::{
    Connection, DEFAULT_HANDSHAKE_TIMEOUT, Handshake, Transport, WebSocketConnection,
    WebSocketTransport,
};

use crate::MazeraceError;
use crate::handler::handle_connection;
use crate::stats::stream_stats;

/// Default upgrade path for player connections.
pub const DEFAULT_USER_PATH: &str = "/user-socket/";

/// Default upgrade path for the stats stream.
pub const DEFAULT_STATS_PATH: &str = "/stats-socket/";

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) games: GameManager,
    pub(crate) codec: C,
    pub(crate) stats_interval: Duration,
    next_user_id: AtomicU64,
}

impl<C: Codec> ServerState<C> {
    pub(crate) fn new(games: GameManager, codec: C, stats_interval: Duration) -> Self {
        Self {
            games,
            codec,
            stats_interval,
            next_user_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_user_id(&self) -> UserId {
        UserId(self.next_user_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Builder for configuring and starting a Mazerace server.
///
/// # Example
///
/// ```rust,no_run
/// use mazerace::prelude::*;
///
/// # async fn start() -> Result<(), MazeraceError> {
/// let server = MazeraceServer::builder()
///     .bind("0.0.0.0:8080")
///     .lobby_config(LobbyConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct MazeraceServerBuilder {
    bind_addr: String,
    lobby_config: LobbyConfig,
    stats_interval: Duration,
    handshake_timeout: Duration,
    user_path: String,
    stats_path: String,
}

impl MazeraceServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            lobby_config: LobbyConfig::default(),
            stats_interval: Duration::from_secs(1),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            user_path: DEFAULT_USER_PATH.to_string(),
            stats_path: DEFAULT_STATS_PATH.to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the token alphabet, board size, window size and seed.
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby_config = config;
        self
    }

    /// Sets how often the stats stream pushes a snapshot.
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Sets how long a new client has to complete the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the upgrade path served as a player connection.
    pub fn user_path(mut self, path: &str) -> Self {
        self.user_path = path.to_string();
        self
    }

    /// Sets the upgrade path served as the stats stream.
    pub fn stats_path(mut self, path: &str) -> Self {
        self.stats_path = path.to_string();
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<MazeraceServer, MazeraceError> {
        let transport = WebSocketTransport::bind(&self.bind_addr)
            .await?
            .with_handshake_timeout(self.handshake_timeout);

        let stats_interval = if self.stats_interval.is_zero() {
            tracing::warn!("stats interval must be positive, using 1s");
            Duration::from_secs(1)
        } else {
            self.stats_interval
        };

        let state = Arc::new(ServerState::new(
            GameManager::new(self.lobby_config),
            JsonCodec,
            stats_interval,
        ));

        Ok(MazeraceServer {
            transport,
            state,
            user_path: self.user_path,
            stats_path: self.stats_path,
        })
    }
}

impl Default for MazeraceServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Mazerace server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MazeraceServer {
    transport: WebSocketTransport,
    state: Arc<ServerState<JsonCodec>>,
    user_path: String,
    stats_path: String,
}

impl MazeraceServer {
    /// Creates a new builder.
    pub fn builder() -> MazeraceServerBuilder {
        MazeraceServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Every accepted client gets its own task, which runs the upgrade
    /// and then the endpoint. A failed accept or upgrade is logged and
    /// only ever costs that one client.
    pub async fn run(mut self) -> Result<(), MazeraceError> {
        if let Ok(addr) = self.local_addr() {
            tracing::info!(%addr, "Mazerace server listening");
        }

        let routes = Arc::new(Routes {
            user_path: self.user_path,
            stats_path: self.stats_path,
        });
        loop {
            let pending = match self.transport.accept().await {
                Ok(pending) => pending,
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    continue;
                }
            };

            let state = Arc::clone(&self.state);
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let peer = pending.peer_addr();
                match pending.complete().await {
                    Ok(conn) => routes.serve(conn, state).await,
                    Err(e) => tracing::debug!(%peer, error = %e, "handshake failed"),
                }
            });
        }
    }
}

struct Routes {
    user_path: String,
    stats_path: String,
}

impl Routes {
    async fn serve(&self, conn: WebSocketConnection, state: Arc<ServerState<JsonCodec>>) {
        let conn_id = conn.id();
        if conn.path() == self.user_path {
            if let Err(e) = handle_connection(conn, state).await {
                tracing::debug!(%conn_id, error = %e, "connection ended with error");
            }
        } else if conn.path() == self.stats_path {
            if let Err(e) = stream_stats(conn, state).await {
                tracing::debug!(%conn_id, error = %e, "stats stream ended with error");
            }
        } else {
            tracing::debug!(%conn_id, path = conn.path(), "unknown path, closing");
            let _ = conn.close().await;
        }
    }
}
