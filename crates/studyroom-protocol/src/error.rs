//! Error types for the protocol layer.
//!
//! Each crate in Study Room defines its own error enum. A `ProtocolError`
//! always means the bytes or records on the wire were wrong, never that the
//! network or the simulation misbehaved.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, wrong data
    /// types, or truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A record does not match the schema descriptor it claims to follow.
    ///
    /// Raised by both `encode_record` and `decode_record`: a record with the
    /// wrong number of fields, or a field whose type tag differs from the
    /// descriptor's, never reaches a domain type.
    #[error("schema {schema}: {reason}")]
    Schema {
        schema: &'static str,
        reason: String,
    },

    /// The message is invalid at the protocol level.
    ///
    /// For logical errors that pass deserialization but violate protocol
    /// rules, e.g. a patch addressing a collection the receiver doesn't have.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Shorthand for a [`ProtocolError::Schema`] error.
    pub fn schema(schema: &'static str, reason: impl Into<String>) -> Self {
        Self::Schema {
            schema,
            reason: reason.into(),
        }
    }
}
