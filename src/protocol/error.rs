//! Protocol Error Types

use crate::protocol::codes;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProtocolError {
    #[error("missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("malformed parameter {name}: {reason}")]
    MalformedParameter { name: String, reason: String },

    #[error("no processor registered for message type: {msg_type}")]
    UnknownMessageType { msg_type: String },

    #[error("message kind {kind} does not match the {msg_type} processor")]
    KindMismatch { msg_type: String, kind: String },
}

impl ProtocolError {
    pub fn return_code(&self) -> i32 {
        match self {
            ProtocolError::MissingParameter { .. } => codes::RC_INVALID_PARAMETER,
            ProtocolError::MalformedParameter { .. } => codes::RC_INVALID_PARAMETER,
            ProtocolError::UnknownMessageType { .. } => codes::RC_NOT_SUPPORTED,
            ProtocolError::KindMismatch { .. } => codes::RC_INVALID_PARAMETER,
        }
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
