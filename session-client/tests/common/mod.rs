#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::extract::Path;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::CookieJar;
use serde_json::json;
use serde_json::Value;

pub const EMAIL: &str = "admin@email.com";
pub const PASSWORD: &str = "Admin123!";
pub const USER_ID: &str = "6f1c2a3b-4d5e-4f60-8a7b-9c0d1e2f3a4b";

/// Recorded behaviour and knobs of the stub API
#[derive(Default)]
pub struct StubState {
    pub refresh_calls: AtomicUsize,
    pub fail_refresh: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    pub bearer_on_token_endpoints: AtomicBool,
    valid_token: Mutex<String>,
    accepted_tokens: Mutex<Vec<String>>,
}

impl StubState {
    /// Make every access token issued so far fail with 401
    pub fn expire_access_tokens(&self) {
        self.valid_token.lock().unwrap().clear();
        self.accepted_tokens.lock().unwrap().clear();
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn accepted_tokens(&self) -> Vec<String> {
        self.accepted_tokens.lock().unwrap().clone()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .unwrap_or_default();

        let valid = self.valid_token.lock().unwrap().clone();
        if valid.is_empty() || token != valid {
            return Err(error(StatusCode::UNAUTHORIZED, "Invalid or expired token"));
        }

        self.accepted_tokens.lock().unwrap().push(token.to_string());
        Ok(())
    }
}

/// Stub of the user management API, served on a random local port
pub struct StubApi {
    pub base_url: String,
    pub state: Arc<StubState>,
}

impl StubApi {
    pub async fn spawn() -> Self {
        let state = Arc::new(StubState::default());

        let router = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/logout", post(logout))
            .route("/api/users", get(list_users).post(create_user))
            .route("/api/users/:id", get(get_user).patch(update_user))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}/api", port),
            state,
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "statusCode": status.as_u16(), "message": message })),
    )
        .into_response()
}

pub fn user_json(email: &str, bio: Option<&str>) -> Value {
    json!({
        "id": USER_ID,
        "email": email,
        "name": "Admin User",
        "firstName": "Admin",
        "lastName": "User",
        "jobTitle": null,
        "bio": bio,
        "isActive": true,
        "role": "admin",
        "createdAt": "2024-11-26T17:00:00Z",
        "updatedAt": "2024-11-26T17:00:00Z",
    })
}

fn refresh_cookie(value: String) -> Cookie<'static> {
    Cookie::build(("refreshToken", value))
        .http_only(true)
        .path("/")
        .build()
}

async fn login(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<Value>,
) -> Response {
    if headers.contains_key(AUTHORIZATION) {
        state.bearer_on_token_endpoints.store(true, Ordering::SeqCst);
    }

    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    *state.valid_token.lock().unwrap() = "access-0".to_string();
    (
        jar.add(refresh_cookie("refresh-0".to_string())),
        Json(json!({ "accessToken": "access-0", "user": user_json(EMAIL, None) })),
    )
        .into_response()
}

async fn refresh(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    if headers.contains_key(AUTHORIZATION) {
        state.bearer_on_token_endpoints.store(true, Ordering::SeqCst);
    }

    let call = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if state.fail_refresh.load(Ordering::SeqCst) || jar.get("refreshToken").is_none() {
        return error(StatusCode::UNAUTHORIZED, "Invalid or expired refresh token");
    }

    let token = format!("access-{}", call);
    *state.valid_token.lock().unwrap() = token.clone();
    (
        jar.add(refresh_cookie(format!("refresh-{}", call))),
        Json(json!({ "accessToken": token, "user": user_json(EMAIL, None) })),
    )
        .into_response()
}

async fn logout(jar: CookieJar) -> impl IntoResponse {
    let expired = Cookie::build(("refreshToken", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    (jar.add(expired), StatusCode::NO_CONTENT)
}

async fn list_users(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }
    Json(json!({
        "data": [user_json(EMAIL, None)],
        "total": 1,
        "page": 1,
        "limit": 20,
    }))
    .into_response()
}

async fn get_user(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }
    if id != USER_ID {
        return error(StatusCode::NOT_FOUND, "User not found");
    }
    Json(user_json(EMAIL, None)).into_response()
}

async fn create_user(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }
    let email = body["email"].as_str().unwrap_or_default().to_string();
    (StatusCode::CREATED, Json(user_json(&email, None))).into_response()
}

async fn update_user(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }
    Json(user_json(EMAIL, body["bio"].as_str())).into_response()
}
