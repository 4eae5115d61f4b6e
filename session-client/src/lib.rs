//! Client-side session handling for the user management API.
//!
//! [`SessionController`] logs in, keeps the access token, attaches it to every
//! request and, when the API answers `401`, performs a single silent refresh
//! shared by all requests that failed concurrently before retrying them once.
//! The refresh token never leaves the HTTP client's cookie store.
//!
//! Session changes are published on a [`tokio::sync::watch`] channel;
//! [`SessionState::LoggedOut`] is the signal to show the login screen.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use session_client::{MemorySessionStore, SessionConfig, SessionController};
//!
//! # async fn run() -> Result<(), session_client::SessionError> {
//! let config = SessionConfig::new("http://localhost:3000/api")?;
//! let session = SessionController::new(config, Arc::new(MemorySessionStore::new()))?;
//!
//! session.login("admin@email.com", "Admin123!").await?;
//! let page = session.list_users(&Default::default()).await?;
//! println!("{} users", page.total);
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod errors;
pub mod models;
pub mod store;

pub use controller::SessionConfig;
pub use controller::SessionController;
pub use controller::DEFAULT_REFRESH_TIMEOUT;
pub use errors::SessionError;
pub use models::CreateUser;
pub use models::ListUsersParams;
pub use models::Page;
pub use models::SessionState;
pub use models::UpdateUser;
pub use models::User;
pub use store::FileSessionStore;
pub use store::MemorySessionStore;
pub use store::PersistedSession;
pub use store::SessionStore;
