//! Error types for the protocol layer.
//!
//! Each Railyard crate owns one error enum. A `ProtocolError` always means
//! a frame could not be turned into (or built from) a message; it never
//! describes networking or simulation problems.

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A message could not be serialized.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A frame could not be parsed: malformed JSON, an unknown `type`
    /// tag, or fields of the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
