use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ListUsersQuery;
use crate::domain::user::models::Page;
use crate::domain::user::models::Password;
use crate::domain::user::models::SafeUser;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: auth::PasswordHasher,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>) -> Self {
        Self {
            repository,
            password_hasher: auth::PasswordHasher::new(),
        }
    }

    fn hash(&self, password: &Password) -> Result<String, UserError> {
        self.password_hasher
            .hash(password.expose())
            .map_err(|e| UserError::PasswordHashing(e.to_string()))
    }

    async fn ensure_email_free(
        &self,
        email: &EmailAddress,
        owner: Option<&UserId>,
    ) -> Result<(), UserError> {
        match self.repository.find_by_email(email).await? {
            Some(existing) if Some(&existing.id) != owner => {
                Err(UserError::EmailAlreadyExists(email.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<SafeUser, UserError> {
        self.ensure_email_free(&command.email, None).await?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            password_hash: self.hash(&command.password)?,
            email: command.email,
            first_name: command.first_name,
            last_name: command.last_name,
            job_title: command.job_title,
            bio: command.bio,
            is_active: command.is_active.unwrap_or(true),
            role: command.role.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(user).await?;
        tracing::info!(user_id = %created.id, role = %created.role, "User created");

        Ok(created.into())
    }

    async fn list_users(&self, query: ListUsersQuery) -> Result<Page<SafeUser>, UserError> {
        let filters = query.filters.normalized();
        let (users, total) = self
            .repository
            .list_paginated(&filters, query.pagination)
            .await?;

        Ok(Page {
            data: users.into_iter().map(SafeUser::from).collect(),
            total,
            page: query.pagination.page(),
            limit: query.pagination.limit(),
        })
    }

    async fn get_user(&self, id: &UserId) -> Result<SafeUser, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(SafeUser::from)
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    async fn find_by_email_with_credential(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserError> {
        self.repository.find_by_email(email).await
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<SafeUser, UserError> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        if let Some(email) = command.email {
            if email != user.email {
                self.ensure_email_free(&email, Some(&user.id)).await?;
            }
            user.email = email;
        }

        if let Some(first_name) = command.first_name {
            user.first_name = first_name;
        }

        if let Some(last_name) = command.last_name {
            user.last_name = last_name;
        }

        if let Some(job_title) = command.job_title {
            user.job_title = job_title;
        }

        if let Some(bio) = command.bio {
            user.bio = bio;
        }

        if let Some(is_active) = command.is_active {
            user.is_active = is_active;
        }

        if let Some(role) = command.role {
            user.role = role;
        }

        if let Some(password) = command.password {
            user.password_hash = self.hash(&password)?;
        }

        user.updated_at = Utc::now();

        let updated = self.repository.update(user).await?;
        tracing::info!(user_id = %updated.id, "User updated");

        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::user::models::JobTitle;
    use crate::domain::user::models::Pagination;
    use crate::domain::user::models::PersonName;
    use crate::domain::user::models::Role;
    use crate::domain::user::models::UserFilters;
    use crate::outbound::repositories::memory::InMemoryUserRepository;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;
            async fn list_paginated(&self, filters: &UserFilters, pagination: Pagination) -> Result<(Vec<User>, i64), UserError>;
            async fn update(&self, user: User) -> Result<User, UserError>;
        }
    }

    fn create_command(email: &str) -> CreateUserCommand {
        CreateUserCommand {
            email: EmailAddress::new(email).unwrap(),
            first_name: PersonName::new("Ada").unwrap(),
            last_name: PersonName::new("Lovelace").unwrap(),
            job_title: Some(JobTitle::new("Engineer").unwrap()),
            bio: None,
            is_active: None,
            role: None,
            password: Password::new("password123").unwrap(),
        }
    }

    fn stored_user(email: &str) -> User {
        let now = Utc::now() - chrono::Duration::minutes(5);
        User {
            id: UserId::new(),
            email: EmailAddress::new(email).unwrap(),
            first_name: PersonName::new("Grace").unwrap(),
            last_name: PersonName::new("Hopper").unwrap(),
            job_title: None,
            bio: Some("old bio".to_string()),
            is_active: true,
            role: Role::User,
            password_hash: "$argon2id$test_hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "ada@example.com"
                    && user.password_hash.starts_with("$argon2id$")
                    && user.role == Role::User
                    && user.is_active
            })
            .times(1)
            .returning(Ok);

        let service = UserService::new(Arc::new(repository));

        let user = service
            .create_user(create_command("Ada@Example.com"))
            .await
            .expect("Failed to create user");

        assert_eq!(user.email.as_str(), "ada@example.com");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_short_circuits() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|email| Ok(Some(stored_user(email.as_str()))));
        repository.expect_create().times(0);

        let service = UserService::new(Arc::new(repository));

        let result = service.create_user(create_command("ada@example.com")).await;
        assert!(matches!(result, Err(UserError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_create_user_store_level_conflict_surfaces() {
        let mut repository = MockTestUserRepository::new();

        // Lost the race: pre-check passes, the unique constraint fires
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .times(1)
            .returning(|user| Err(UserError::EmailAlreadyExists(user.email.to_string())));

        let service = UserService::new(Arc::new(repository));

        let result = service.create_user(create_command("ada@example.com")).await;
        assert!(matches!(result, Err(UserError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_create_then_get_and_find_by_email() {
        let service = UserService::new(Arc::new(InMemoryUserRepository::new()));

        let created = service
            .create_user(create_command("A@B.com"))
            .await
            .expect("Failed to create user");

        let fetched = service.get_user(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.email.as_str(), "a@b.com");
        assert_eq!(fetched.first_name.as_str(), "Ada");
        assert_eq!(fetched.job_title.as_ref().map(JobTitle::as_str), Some("Engineer"));

        let credential = service
            .find_by_email_with_credential(&EmailAddress::new("a@b.com").unwrap())
            .await
            .unwrap()
            .expect("Expected credential record");
        assert_eq!(credential.id, created.id);
        assert!(credential.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_create_case_only_duplicate_conflicts() {
        let service = UserService::new(Arc::new(InMemoryUserRepository::new()));

        service.create_user(create_command("ada@example.com")).await.unwrap();
        let result = service.create_user(create_command("ADA@example.com")).await;

        assert!(matches!(result, Err(UserError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_find_by_email_with_credential_absent_is_none() {
        let service = UserService::new(Arc::new(InMemoryUserRepository::new()));

        let result = service
            .find_by_email_with_credential(&EmailAddress::new("ghost@example.com").unwrap())
            .await;

        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository));

        let result = service.get_user(&UserId::new()).await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_users_second_page() {
        let repository = InMemoryUserRepository::new();
        let base = Utc::now();
        for i in 0..25 {
            let mut user = stored_user(&format!("user{:02}@example.com", i));
            user.created_at = base + chrono::Duration::seconds(i);
            repository.create(user).await.unwrap();
        }

        let service = UserService::new(Arc::new(repository));
        let page = service
            .list_users(ListUsersQuery {
                pagination: Pagination::new(2, 10).unwrap(),
                filters: UserFilters::default(),
            })
            .await
            .unwrap();

        assert_eq!(page.data.len(), 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 10);
        // Newest is user24; page 2 starts at the 11th newest
        assert_eq!(page.data[0].email.as_str(), "user14@example.com");
        assert_eq!(page.data[9].email.as_str(), "user05@example.com");
        assert!(page
            .data
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn test_list_users_last_possible_page_is_empty() {
        let repository = InMemoryUserRepository::new();
        repository
            .create(stored_user("grace@example.com"))
            .await
            .unwrap();

        let service = UserService::new(Arc::new(repository));
        let page = service
            .list_users(ListUsersQuery {
                pagination: Pagination::new(i64::MAX, Pagination::MAX_LIMIT).unwrap(),
                filters: UserFilters::default(),
            })
            .await
            .unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.page, i64::MAX);
    }

    #[tokio::test]
    async fn test_list_users_normalizes_filters() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_list_paginated()
            .withf(|filters, pagination| {
                filters.email.as_deref() == Some("acme")
                    && filters.name.is_none()
                    && pagination.page() == 1
            })
            .times(1)
            .returning(|_, _| Ok((vec![], 0)));

        let service = UserService::new(Arc::new(repository));

        let page = service
            .list_users(ListUsersQuery {
                pagination: Pagination::default(),
                filters: UserFilters {
                    email: Some("ACME".to_string()),
                    name: Some("  ".to_string()),
                    role: None,
                },
            })
            .await
            .unwrap();

        assert_eq!(page.total, 0);
        assert_eq!(page.limit, Pagination::DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn test_update_user_partial_bio_only() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let original = stored_user("grace@example.com");
        let original_id = original.id;
        repository.create(original.clone()).await.unwrap();

        let service = UserService::new(Arc::clone(&repository));
        let updated = service
            .update_user(
                &original_id,
                UpdateUserCommand {
                    bio: Some(Some("new bio".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.bio.as_deref(), Some("new bio"));
        assert_eq!(updated.first_name, original.first_name);
        assert_eq!(updated.email, original.email);
        assert_eq!(updated.role, original.role);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at > original.updated_at);

        let stored = repository.find_by_id(&original_id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, original.password_hash);
    }

    #[tokio::test]
    async fn test_update_user_clears_nullable_and_recomputes_name() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let original = stored_user("grace@example.com");
        let id = original.id;
        repository.create(original).await.unwrap();

        let service = UserService::new(repository);
        let updated = service
            .update_user(
                &id,
                UpdateUserCommand {
                    last_name: Some(PersonName::new("Brewster").unwrap()),
                    bio: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Grace Brewster");
        assert_eq!(updated.bio, None);
    }

    #[tokio::test]
    async fn test_update_user_email_collision() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let grace = stored_user("grace@example.com");
        let grace_id = grace.id;
        repository.create(grace).await.unwrap();
        repository.create(stored_user("ada@example.com")).await.unwrap();

        let service = UserService::new(repository);
        let result = service
            .update_user(
                &grace_id,
                UpdateUserCommand {
                    email: Some(EmailAddress::new("ADA@example.com").unwrap()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_user_same_email_different_case_is_not_a_collision() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let grace = stored_user("grace@example.com");
        let grace_id = grace.id;
        repository.create(grace).await.unwrap();

        let service = UserService::new(repository);
        let updated = service
            .update_user(
                &grace_id,
                UpdateUserCommand {
                    email: Some(EmailAddress::new("Grace@Example.com").unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email.as_str(), "grace@example.com");
    }

    #[tokio::test]
    async fn test_update_user_rehashes_password() {
        let mut repository = MockTestUserRepository::new();
        let existing = stored_user("grace@example.com");
        let id = existing.id;

        repository
            .expect_find_by_id()
            .with(eq(id))
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository
            .expect_update()
            .withf(|user| user.password_hash.starts_with("$argon2id$"))
            .times(1)
            .returning(Ok);

        let service = UserService::new(Arc::new(repository));
        let result = service
            .update_user(
                &id,
                UpdateUserCommand {
                    password: Some(Password::new("brand-new-password").unwrap()),
                    ..Default::default()
                },
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_update().times(0);

        let service = UserService::new(Arc::new(repository));
        let result = service
            .update_user(&UserId::new(), UpdateUserCommand::default())
            .await;

        assert!(matches!(result, Err(UserError::NotFound(_))));
    }
}
