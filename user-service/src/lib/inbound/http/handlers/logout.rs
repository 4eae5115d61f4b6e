use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;

use crate::inbound::http::router::AppState;

/// Expire the refresh cookie. Tokens already issued stay valid until they expire.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.add(state.refresh_cookie.expire()), StatusCode::NO_CONTENT)
}
