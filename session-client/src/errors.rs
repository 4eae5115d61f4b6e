use thiserror::Error;

/// Errors surfaced by the session controller.
///
/// `Clone` so one refresh outcome can be handed to every waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session is gone: refresh failed or the user logged out meanwhile.
    #[error("Session expired, log in again")]
    Unauthorized,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SessionError::Decode(e.to_string())
        } else if e.is_builder() {
            SessionError::InvalidRequest(e.to_string())
        } else {
            SessionError::Transport(e.to_string())
        }
    }
}
