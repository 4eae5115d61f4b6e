use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    pub email: String,

    pub role: String,

    /// Display name
    pub name: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Unique token identifier; keeps two tokens minted in the same second distinct
    pub jti: String,
}

impl Claims {
    /// Create claims for a user. `iat`/`exp` are stamped by the issuer at signing time.
    pub fn for_user(
        user_id: impl ToString,
        email: impl Into<String>,
        role: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            role: role.into(),
            name: name.into(),
            iat: 0,
            exp: 0,
            jti: String::new(),
        }
    }

    /// Copy of these claims valid for `ttl` starting now, with a fresh `jti`.
    pub fn stamped(&self, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_user() {
        let claims = Claims::for_user("user123", "alice@example.com", "admin", "Alice Doe");

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.name, "Alice Doe");
    }

    #[test]
    fn test_stamped() {
        let claims = Claims::for_user("user123", "alice@example.com", "user", "Alice");
        let stamped = claims.stamped(Duration::minutes(15));

        assert_eq!(stamped.exp - stamped.iat, 15 * 60);
        assert!(!stamped.jti.is_empty());
        assert_eq!(stamped.sub, claims.sub);

        let again = claims.stamped(Duration::minutes(15));
        assert_ne!(stamped.jti, again.jti);
    }
}
