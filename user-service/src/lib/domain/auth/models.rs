use std::fmt;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::SafeUser;

/// Login attempt. The password is only compared, never validated against policy.
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Result of a successful login or refresh.
///
/// The HTTP layer moves `refresh_token` into an HttpOnly cookie; it never
/// appears in a response body.
#[derive(Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SafeUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user.id)
            .finish_non_exhaustive()
    }
}
