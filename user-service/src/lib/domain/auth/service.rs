use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::Claims;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::SafeUser;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserServicePort;

/// Login and refresh orchestration.
///
/// Stateless: tokens are issued and verified, never stored. A refresh token
/// is retired only implicitly, by handing the client a new one.
pub struct AuthService<US>
where
    US: UserServicePort,
{
    users: Arc<US>,
    authenticator: Arc<Authenticator>,
}

impl<US> AuthService<US>
where
    US: UserServicePort,
{
    pub fn new(users: Arc<US>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            users,
            authenticator,
        }
    }

    fn issue(&self, user: SafeUser) -> Result<AuthSession, AuthError> {
        let claims = Claims::for_user(
            user.id,
            user.email.as_str(),
            user.role.as_str(),
            user.name.as_str(),
        );

        let pair = self
            .authenticator
            .issue_pair(&claims)
            .map_err(|e| AuthError::TokenIssuance(e.to_string()))?;

        Ok(AuthSession {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user,
        })
    }
}

#[async_trait]
impl<US> AuthServicePort for AuthService<US>
where
    US: UserServicePort,
{
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError> {
        let Some(user) = self
            .users
            .find_by_email_with_credential(&command.email)
            .await?
        else {
            tracing::info!("Login rejected: unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        let password_matches = self
            .authenticator
            .verify_password(&command.password, &user.password_hash)
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                AuthError::CredentialCheck(e.to_string())
            })?;

        if !password_matches {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login rejected: account deactivated");
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.issue(user.into())?;
        tracing::info!(user_id = %session.user.id, "Login succeeded");

        Ok(session)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let claims = self.authenticator.verify_refresh(refresh_token).map_err(|e| {
            tracing::info!(error = %e, "Refresh rejected: token did not verify");
            AuthError::InvalidRefreshToken
        })?;

        let user_id =
            UserId::from_string(&claims.sub).map_err(|_| AuthError::InvalidRefreshToken)?;

        let user = match self.users.get_user(&user_id).await {
            Ok(user) => user,
            Err(UserError::NotFound(_)) => {
                tracing::info!(user_id = %user_id, "Refresh rejected: user no longer exists");
                return Err(AuthError::InvalidRefreshToken);
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            tracing::info!(user_id = %user_id, "Refresh rejected: account deactivated");
            return Err(AuthError::InvalidRefreshToken);
        }

        self.issue(user)
    }
}
