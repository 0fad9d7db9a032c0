/// Failure converting between wire text and protocol types.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("could not serialize payload: {0}")]
    Encode(serde_json::Error),

    /// The bytes were not valid JSON or did not fit the target type.
    #[cfg(feature = "json")]
    #[error("could not parse payload: {0}")]
    Decode(serde_json::Error),
}
