use thiserror::Error;

/// Error type for token operations.
///
/// Verification failures all map to [`TokenError::InvalidToken`]:
/// callers cannot tell a forged signature from an expired or malformed token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    SigningFailed(String),

    #[error("Token is invalid or expired")]
    InvalidToken,
}
