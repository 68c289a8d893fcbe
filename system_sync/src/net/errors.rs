//! Wire protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding protocol messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Text that is not a known client message
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Message size exceeded maximum allowed
    #[error("message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },
}

impl ProtocolError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "MalformedMessage",
            Self::MessageTooLarge { .. } => "MessageTooLarge",
        }
    }
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
