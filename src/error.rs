//! Error types for NeuroCrypt sessions

use thiserror::Error;

/// Errors that can occur while running a capture session or talking to the scorer
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),

    #[error("{call} timed out after {after_ms}ms")]
    Timeout { call: &'static str, after_ms: u64 },

    #[error("{0}")]
    Transport(String),

    #[error("{call} failed ({status}): {message}")]
    Status {
        call: &'static str,
        status: u16,
        message: String,
    },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Load(String),

    #[error("Cannot {action} while session is {from}")]
    InvalidTransition { from: String, action: &'static str },
}

impl SessionError {
    /// Whether this error counts as a network failure of the handshake
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SessionError::Timeout { .. }
                | SessionError::Transport(_)
                | SessionError::Status { .. }
                | SessionError::Decode(_)
        )
    }
}
