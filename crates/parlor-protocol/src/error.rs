//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Covers malformed JSON, missing fields, and
    /// unknown `type` tags alike — the handler treats all of these as an
    /// empty no-op envelope.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
