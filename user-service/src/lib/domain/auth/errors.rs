use thiserror::Error;

use crate::user::errors::UserError;

/// Errors produced by login and refresh.
///
/// `InvalidCredentials` is returned for an unknown email, a wrong password and
/// a deactivated account alike, so callers cannot probe which emails exist.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),

    #[error("Credential check failed: {0}")]
    CredentialCheck(String),

    #[error(transparent)]
    User(#[from] UserError),
}
