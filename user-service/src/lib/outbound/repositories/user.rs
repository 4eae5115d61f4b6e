use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::JobTitle;
use crate::domain::user::models::Pagination;
use crate::domain::user::models::PersonName;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilters;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

const USER_COLUMNS: &str = "id, email, name, first_name, last_name, job_title, bio, \
                            is_active, role, password_hash, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    // Denormalized display name, kept for the name filter
    #[allow(dead_code)]
    name: String,
    first_name: String,
    last_name: String,
    job_title: Option<String>,
    bio: Option<String>,
    is_active: bool,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            UserError::DatabaseError(format!("user {} has invalid {}: {}", row.id, field, e))
        };

        Ok(User {
            id: UserId(row.id),
            email: EmailAddress::new(&row.email).map_err(|e| corrupt("email", &e))?,
            first_name: PersonName::new(row.first_name.as_str())
                .map_err(|e| corrupt("first_name", &e))?,
            last_name: PersonName::new(row.last_name.as_str())
                .map_err(|e| corrupt("last_name", &e))?,
            job_title: row
                .job_title
                .as_deref()
                .map(JobTitle::new)
                .transpose()
                .map_err(|e| corrupt("job_title", &e))?,
            role: row.role.parse().map_err(|e| corrupt("role", &e))?,
            bio: row.bio,
            is_active: row.is_active,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn map_write_error(e: sqlx::Error, email: &EmailAddress) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) {
            return UserError::EmailAlreadyExists(email.to_string());
        }
    }
    UserError::DatabaseError(e.to_string())
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &UserFilters) {
    builder.push(" WHERE TRUE");

    // strpos instead of LIKE so that % and _ in the filter are literal
    if let Some(email) = &filters.email {
        builder
            .push(" AND strpos(lower(email), ")
            .push_bind(email.clone())
            .push(") > 0");
    }

    if let Some(name) = &filters.name {
        builder
            .push(" AND strpos(lower(name), ")
            .push_bind(name.clone())
            .push(") > 0");
    }

    if let Some(role) = filters.role {
        builder.push(" AND role = ").push_bind(role.as_str());
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, first_name, last_name, job_title, bio,
                               is_active, role, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(user.name())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.job_title.as_ref().map(JobTitle::as_str))
        .bind(user.bio.as_deref())
        .bind(user.is_active)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user.email))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn list_paginated(
        &self,
        filters: &UserFilters,
        pagination: Pagination,
    ) -> Result<(Vec<User>, i64), UserError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count_query, filters);

        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let mut page_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
        push_filters(&mut page_query, filters);
        page_query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = page_query
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, total))
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, name = $3, first_name = $4, last_name = $5, job_title = $6,
                bio = $7, is_active = $8, role = $9, password_hash = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(user.name())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.job_title.as_ref().map(JobTitle::as_str))
        .bind(user.bio.as_deref())
        .bind(user.is_active)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user.email))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }
}
