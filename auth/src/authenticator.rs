use chrono::Duration;

use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::token::Claims;
use crate::token::TokenError;
use crate::token::TokenIssuer;

/// Authentication coordinator combining password verification and token issuance.
///
/// Owns one issuer for access tokens and a second, independently keyed issuer
/// for refresh tokens.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    access: TokenIssuer,
    refresh: TokenIssuer,
}

/// Secret and lifetime for one kind of token.
#[derive(Debug, Clone, Copy)]
pub struct TokenSettings<'a> {
    pub secret: &'a [u8],
    pub ttl: Duration,
}

/// Freshly issued access + refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Access and refresh tokens must be signed with different secrets")]
    SharedSecret,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Errors
    /// * `SharedSecret` - Access and refresh secrets are identical
    pub fn new(
        access: TokenSettings<'_>,
        refresh: TokenSettings<'_>,
    ) -> Result<Self, AuthenticationError> {
        if access.secret == refresh.secret {
            return Err(AuthenticationError::SharedSecret);
        }

        Ok(Self {
            password_hasher: PasswordHasher::new(),
            access: TokenIssuer::new(access.secret, access.ttl),
            refresh: TokenIssuer::new(refresh.secret, refresh.ttl),
        })
    }

    /// Hash a password for storage.
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a password against a stored hash. A mismatch is `Ok(false)`.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Issue an access token and a refresh token for the same claims.
    ///
    /// # Errors
    /// * `SigningFailed` - Either token could not be signed
    pub fn issue_pair(&self, claims: &Claims) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.access.sign(claims)?,
            refresh_token: self.refresh.sign(claims)?,
        })
    }

    /// Verify an access token.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.access.verify(token)
    }

    /// Verify a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.refresh.verify(token)
    }

    /// Lifetime of refresh tokens, used for the refresh cookie's `Max-Age`.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl()
    }
}
