use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Deserializer;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::FieldErrors;
use super::UserData;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::JobTitle;
use crate::domain::user::models::Password;
use crate::domain::user::models::PersonName;
use crate::domain::user::models::Role;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::UserId;
use crate::inbound::http::router::AppState;
use crate::user::ports::UserServicePort;

/// HTTP request body for updating a user (raw JSON).
///
/// Absent fields are left untouched. `jobTitle` and `bio` accept `null` or an
/// empty string to clear the stored value.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    job_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    bio: Option<Option<String>>,
    is_active: Option<bool>,
    role: Option<String>,
    password: Option<String>,
}

/// Distinguish an explicit `null` (`Some(None)`) from an absent field (`None`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateUserRequest {
    fn try_into_command(self) -> Result<UpdateUserCommand, ApiError> {
        let mut errors = FieldErrors::new();
        let mut command = UpdateUserCommand::default();

        if let Some(email) = self.email {
            command.email = errors.check("email", EmailAddress::new(email));
        }
        if let Some(first_name) = self.first_name {
            command.first_name = errors.check("firstName", PersonName::new(first_name));
        }
        if let Some(last_name) = self.last_name {
            command.last_name = errors.check("lastName", PersonName::new(last_name));
        }
        if let Some(job_title) = self.job_title {
            command.job_title = match job_title.filter(|t| !t.trim().is_empty()) {
                Some(title) => errors.check("jobTitle", JobTitle::new(title)).map(Some),
                None => Some(None),
            };
        }
        if let Some(bio) = self.bio {
            command.bio = Some(bio.filter(|b| !b.is_empty()));
        }
        if let Some(role) = self.role {
            command.role = errors.check("role", role.parse::<Role>());
        }
        if let Some(password) = self.password {
            command.password = errors.check("password", Password::new(password));
        }
        command.is_active = self.is_active;

        errors.into_result()?;
        Ok(command)
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let user_id = UserId::from_string(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let command = req.try_into_command()?;

    state
        .user_service
        .update_user(&user_id, command)
        .await
        .map_err(ApiError::from)
        .map(|user| ApiSuccess::new(StatusCode::OK, user.into()))
}
