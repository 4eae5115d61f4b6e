use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::SameSite;
use axum_extra::extract::CookieJar;
use time::Duration;

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Attributes of the refresh token cookie.
#[derive(Debug, Clone, Copy)]
pub struct RefreshCookie {
    pub max_age: Duration,
    /// Set in production, where the API is only reachable over TLS
    pub secure: bool,
}

impl RefreshCookie {
    pub fn new(max_age_seconds: i64, secure: bool) -> Self {
        Self {
            max_age: Duration::seconds(max_age_seconds),
            secure,
        }
    }

    /// HttpOnly cookie carrying the refresh token, scoped to the whole site.
    pub fn issue(&self, token: String) -> Cookie<'static> {
        Cookie::build((REFRESH_COOKIE_NAME, token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(self.max_age)
            .build()
    }

    /// Removal cookie with the same attributes and a zero Max-Age.
    pub fn expire(&self) -> Cookie<'static> {
        Cookie::build((REFRESH_COOKIE_NAME, ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(Duration::ZERO)
            .build()
    }
}

pub fn refresh_token(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|value| !value.is_empty())
}
