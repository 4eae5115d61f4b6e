use async_trait::async_trait;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::LoginCommand;

/// Port for the login/refresh flow.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Verify credentials and issue a fresh token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, wrong password or deactivated account
    /// * `TokenIssuance` - Signing failed
    /// * `CredentialCheck` - Stored hash unreadable
    /// * `User` - Lookup failed for infrastructure reasons
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError>;

    /// Exchange a refresh token for a new, rotated token pair.
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - Bad signature, expired, or the user is gone or deactivated
    /// * `TokenIssuance` - Signing failed
    /// * `User` - Lookup failed for infrastructure reasons
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;
}
