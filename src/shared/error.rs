//! Shared Error Types
//!
//! Error types used on both sides of the wire protocol: payload decoding
//! and validation failures that are not specific to the server.
//!
//! None of these abort a session. Malformed engine payloads degrade to a
//! catch-all handling path (see the session module); these errors exist so
//! the degradation is signalled instead of silent.
use thiserror::Error;

/// Errors shared between protocol decoding and the session layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// An engine callback payload did not have the shape its event type
    /// promises (e.g. a per-view event without a parsable `viewId`).
    #[error("Malformed event payload: {message}")]
    MalformedEventPayload {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new malformed-payload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEventPayload {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
