use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;

/// Signs and verifies HS256 tokens under one secret with one lifetime.
///
/// Access and refresh tokens each get their own issuer so that neither secret
/// can mint the other kind of token.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer.
    ///
    /// # Arguments
    /// * `secret` - HMAC key, at least 32 bytes recommended
    /// * `ttl` - Lifetime stamped into every signed token
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign claims, stamping `iat`, `exp` and `jti`.
    ///
    /// # Errors
    /// * `SigningFailed` - Serialization or signing failed
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            &claims.stamped(self.ttl),
            &self.encoding_key,
        )
        .map_err(|e| TokenError::SigningFailed(e.to_string()))
    }

    /// Verify signature and expiry and return the claims.
    ///
    /// # Errors
    /// * `InvalidToken` - Bad signature, malformed token, or expired
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::InvalidToken)
    }
}
