use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::FieldErrors;
use super::UserData;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    let command = body.try_into_command()?;

    let session = state
        .auth_service
        .login(command)
        .await
        .map_err(ApiError::from)?;

    Ok(session_response(&state, jar, session))
}

/// Move the refresh token into its cookie and answer with the rest.
pub(super) fn session_response(
    state: &AppState,
    jar: CookieJar,
    session: AuthSession,
) -> (CookieJar, ApiSuccess<SessionResponseData>) {
    let jar = jar.add(state.refresh_cookie.issue(session.refresh_token));
    (
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            SessionResponseData {
                access_token: session.access_token,
                user: session.user.into(),
            },
        ),
    )
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

impl LoginRequest {
    fn try_into_command(self) -> Result<LoginCommand, ApiError> {
        let mut errors = FieldErrors::new();
        let email = errors.check("email", EmailAddress::new(&self.email));
        if self.password.is_empty() {
            errors.push("password", "must not be empty");
        }
        errors.into_result()?;

        match email {
            Some(email) => Ok(LoginCommand {
                email,
                password: self.password,
            }),
            None => Err(ApiError::BadRequest("email is required".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponseData {
    pub access_token: String,
    pub user: UserData,
}
