//! Authentication primitives shared by the user service.
//!
//! - Password hashing (Argon2id, random salt per hash)
//! - HS256 token signing and verification with embedded expiry
//! - An [`Authenticator`] that pairs the hasher with separately keyed access
//!   and refresh token issuers
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! assert!(!hasher.verify("other", &hash).unwrap());
//! ```
//!
//! ## Token Pairs
//! ```
//! use auth::{Authenticator, Claims, TokenSettings};
//! use chrono::Duration;
//!
//! let auth = Authenticator::new(
//!     TokenSettings { secret: b"access_secret_key_at_least_32_bytes!", ttl: Duration::minutes(15) },
//!     TokenSettings { secret: b"refresh_secret_key_at_least_32_bytes", ttl: Duration::days(7) },
//! )
//! .unwrap();
//!
//! let claims = Claims::for_user("user123", "alice@example.com", "user", "Alice");
//! let pair = auth.issue_pair(&claims).unwrap();
//!
//! assert_eq!(auth.verify_access(&pair.access_token).unwrap().sub, "user123");
//! assert!(auth.verify_access(&pair.refresh_token).is_err());
//! ```

pub mod authenticator;
pub mod password;
pub mod token;

pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use authenticator::TokenPair;
pub use authenticator::TokenSettings;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::Claims;
pub use token::TokenError;
pub use token::TokenIssuer;
