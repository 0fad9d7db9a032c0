//! Stats stream: periodic lobby occupancy snapshots.

use std::sync::Arc;

use mazerace_protocol::Codec;
use mazerace_transport::{Connection, WebSocketConnection};
use tokio::time::MissedTickBehavior;

use crate::MazeraceError;
use crate::server::ServerState;

/// Pushes the game manager's lobby list to `conn` every stats interval,
/// starting immediately, until the subscriber disconnects or a write
/// fails. Inbound frames are ignored.
pub(crate) async fn stream_stats<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), MazeraceError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "stats subscriber connected");

    let mut ticker = tokio::time::interval(state.stats_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let result: Result<(), MazeraceError> = loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = state.games.state().await;
                let text = match state.codec.encode(&snapshot) {
                    Ok(text) => text,
                    Err(e) => break Err(e.into()),
                };
                if let Err(e) = conn.send(&text).await {
                    tracing::debug!(%conn_id, error = %e, "stats delivery failed");
                    break Ok(());
                }
            }
            frame = conn.recv() => match frame {
                Ok(Some(_)) => {}
                Ok(None) => break Ok(()),
                Err(e) => break Err(e.into()),
            },
        }
    };

    let _ = conn.close().await;
    tracing::debug!(%conn_id, "stats subscriber disconnected");
    result
}
