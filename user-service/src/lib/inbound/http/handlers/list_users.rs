use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiQuery;
use super::ApiSuccess;
use super::FieldErrors;
use super::UserData;
use crate::domain::user::models::ListUsersQuery;
use crate::domain::user::models::Page;
use crate::domain::user::models::Pagination;
use crate::domain::user::models::Role;
use crate::domain::user::models::SafeUser;
use crate::domain::user::models::UserFilters;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::router::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListUsersParams>,
) -> Result<ApiSuccess<ListUsersResponseData>, ApiError> {
    let query = params.try_into_query()?;

    state
        .user_service
        .list_users(query)
        .await
        .map_err(ApiError::from)
        .map(|page| ApiSuccess::new(StatusCode::OK, page.into()))
}

/// Raw query string parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersParams {
    page: Option<i64>,
    limit: Option<i64>,
    email: Option<String>,
    name: Option<String>,
    role: Option<String>,
}

impl ListUsersParams {
    fn try_into_query(self) -> Result<ListUsersQuery, ApiError> {
        let mut errors = FieldErrors::new();

        let page = self.page.unwrap_or(Pagination::DEFAULT_PAGE);
        if page < 1 {
            errors.push("page", "must be at least 1");
        }
        let limit = self.limit.unwrap_or(Pagination::DEFAULT_LIMIT);
        if !(1..=Pagination::MAX_LIMIT).contains(&limit) {
            errors.push(
                "limit",
                format!("must be between 1 and {}", Pagination::MAX_LIMIT),
            );
        }

        let role = self
            .role
            .filter(|r| !r.is_empty())
            .and_then(|r| errors.check("role", r.parse::<Role>()));

        errors.into_result()?;

        let pagination =
            Pagination::new(page, limit).map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(ListUsersQuery {
            pagination,
            filters: UserFilters {
                email: self.email,
                name: self.name,
                role,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListUsersResponseData {
    pub data: Vec<UserData>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl From<Page<SafeUser>> for ListUsersResponseData {
    fn from(page: Page<SafeUser>) -> Self {
        let page = page.map(UserData::from);
        Self {
            data: page.data,
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}
