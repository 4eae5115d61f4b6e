use async_trait::async_trait;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ListUsersQuery;
use crate::domain::user::models::Page;
use crate::domain::user::models::Pagination;
use crate::domain::user::models::SafeUser;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilters;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;

/// Port for user directory operations.
///
/// Every method except [`UserServicePort::find_by_email_with_credential`]
/// returns password-free [`SafeUser`] projections.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Create new user.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Normalized email is already registered
    /// * `PasswordHashing` - Hashing the password failed
    /// * `DatabaseError` - Database operation failed
    async fn create_user(&self, command: CreateUserCommand) -> Result<SafeUser, UserError>;

    /// List users newest first, one page at a time.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_users(&self, query: ListUsersQuery) -> Result<Page<SafeUser>, UserError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<SafeUser, UserError>;

    /// Retrieve the full record, password hash included, by email.
    ///
    /// Reserved for the auth service. Absence is `Ok(None)`, not an error.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email_with_credential(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserError>;

    /// Apply a partial update.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email belongs to another user
    /// * `PasswordHashing` - Hashing the new password failed
    /// * `DatabaseError` - Database operation failed
    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<SafeUser, UserError>;
}

/// Persistence operations for user aggregate.
///
/// Implementations must enforce email uniqueness themselves and report a
/// violation as `EmailAlreadyExists`; the service's pre-check is only a fast path.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by normalized email address.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// Retrieve one page of users matching `filters`, ordered by creation time
    /// descending, plus the total match count.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_paginated(
        &self,
        filters: &UserFilters,
        pagination: Pagination,
    ) -> Result<(Vec<User>, i64), UserError>;

    /// Update existing user in storage.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, UserError>;
}
