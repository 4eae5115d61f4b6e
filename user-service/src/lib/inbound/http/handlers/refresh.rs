use axum::extract::State;
use axum_extra::extract::CookieJar;

use super::login::session_response;
use super::login::SessionResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::cookies;
use crate::inbound::http::router::AppState;

/// Exchange the refresh cookie for a new access token and a rotated cookie.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    let token = cookies::refresh_token(&jar)
        .ok_or_else(|| ApiError::Unauthorized("Missing refresh token".to_string()))?;

    let session = state
        .auth_service
        .refresh(&token)
        .await
        .map_err(ApiError::from)?;

    Ok(session_response(&state, jar, session))
}
