use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::FieldErrors;
use super::UserData;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::JobTitle;
use crate::domain::user::models::Password;
use crate::domain::user::models::PersonName;
use crate::domain::user::models::Role;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let command = body.try_into_command()?;

    tracing::debug!(actor = %caller.user_id, email = %command.email, "Creating user");

    state
        .user_service
        .create_user(command)
        .await
        .map_err(ApiError::from)
        .map(|user| ApiSuccess::new(StatusCode::CREATED, user.into()))
}

/// HTTP request body for creating a user (raw JSON)
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    job_title: Option<String>,
    bio: Option<String>,
    is_active: Option<bool>,
    role: Option<String>,
}

impl CreateUserRequest {
    fn try_into_command(self) -> Result<CreateUserCommand, ApiError> {
        let mut errors = FieldErrors::new();

        let email = errors.check("email", EmailAddress::new(&self.email));
        let password = errors.check("password", Password::new(self.password));
        let first_name = errors.check("firstName", PersonName::new(self.first_name));
        let last_name = errors.check("lastName", PersonName::new(self.last_name));
        let job_title = match self.job_title.filter(|t| !t.trim().is_empty()) {
            Some(title) => errors.check("jobTitle", JobTitle::new(title)).map(Some),
            None => Some(None),
        };
        let role = match self.role {
            Some(role) => errors.check("role", role.parse::<Role>()).map(Some),
            None => Some(None),
        };

        errors.into_result()?;

        match (email, password, first_name, last_name, job_title, role) {
            (
                Some(email),
                Some(password),
                Some(first_name),
                Some(last_name),
                Some(job_title),
                Some(role),
            ) => Ok(CreateUserCommand {
                email,
                first_name,
                last_name,
                job_title,
                bio: self.bio,
                is_active: self.is_active,
                role,
                password,
            }),
            _ => Err(ApiError::BadRequest("Invalid request body".to_string())),
        }
    }
}
