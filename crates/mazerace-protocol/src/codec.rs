//! Serialization of outbound payloads.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Turns payloads into frame text and back.
///
/// One instance is shared by every connection task.
pub trait Codec: Send + Sync + 'static {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Parses one frame's payload. Used by clients and tests; the server
    /// itself only reads plain commands.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// JSON via `serde_json`, the format browser clients read directly.
///
/// # Example
///
/// ```rust
/// use mazerace_protocol::{Codec, JsonCodec, LobbyState, UserState};
///
/// let codec = JsonCodec;
/// let state = UserState::Lobby {
///     lobby: LobbyState { players: 1, total: 2, in_progress: false },
/// };
///
/// let text = codec.encode(&state).unwrap();
/// assert!(text.contains("\"mode\":\"LOBBY\""));
///
/// let decoded: UserState = codec.decode(text.as_bytes()).unwrap();
/// assert_eq!(state, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
