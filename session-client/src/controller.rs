use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::future::Shared;
use futures::FutureExt;
use reqwest::header::HeaderValue;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use reqwest::Request;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::errors::SessionError;
use crate::models::CreateUser;
use crate::models::ErrorResponse;
use crate::models::ListUsersParams;
use crate::models::Page;
use crate::models::SessionResponse;
use crate::models::SessionState;
use crate::models::UpdateUser;
use crate::models::User;
use crate::store::PersistedSession;
use crate::store::SessionStore;

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

const LOGIN_PATH: &str = "auth/login";
const REFRESH_PATH: &str = "auth/refresh";
const LOGOUT_PATH: &str = "auth/logout";

type SharedRefresh = Shared<BoxFuture<'static, Result<String, SessionError>>>;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// API root including the `/api` prefix, e.g. `http://localhost:3000/api/`
    pub base_url: Url,
    pub refresh_timeout: Duration,
}

impl SessionConfig {
    /// # Errors
    /// * `InvalidRequest` - `base_url` is not an absolute URL
    pub fn new(base_url: &str) -> Result<Self, SessionError> {
        // Without the trailing slash Url::join would drop the last segment
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        let base_url =
            Url::parse(&normalized).map_err(|e| SessionError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            base_url,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        })
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }
}

/// Client-side session holder.
///
/// Keeps the access token in memory (mirrored to a [`SessionStore`]), attaches
/// it to outgoing requests, and on a `401` performs one silent refresh shared
/// by every request that failed at the same time. Cheap to clone; clones share
/// the session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    config: SessionConfig,
    store: Arc<dyn SessionStore>,
    session: RwLock<Option<PersistedSession>>,
    state: watch::Sender<SessionState>,
    refresh_slot: Mutex<Option<SharedRefresh>>,
}

impl SessionController {
    /// # Errors
    /// * `Transport` - The HTTP client could not be built
    pub fn new(config: SessionConfig, store: Arc<dyn SessionStore>) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let (state, _) = watch::channel(SessionState::LoggedOut);

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                store,
                session: RwLock::new(None),
                state,
                refresh_slot: Mutex::new(None),
            }),
        })
    }

    /// Load a previously persisted session, if any, and publish it.
    pub async fn restore(&self) -> Result<Option<User>, SessionError> {
        let persisted = self.inner.store.load().await?;
        let user = persisted.as_ref().map(|session| session.user.clone());

        *self.inner.session.write().await = persisted;
        self.inner.state.send_replace(match &user {
            Some(user) => SessionState::LoggedIn(user.clone()),
            None => SessionState::LoggedOut,
        });

        Ok(user)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner.access_token().await
    }

    /// Log in and start a session. The refresh cookie is kept by the HTTP client.
    ///
    /// # Errors
    /// * `Api` - Rejected credentials (status 401) or a malformed request (400)
    /// * `Transport` - The API could not be reached
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let request = self
            .inner
            .http
            .post(self.inner.url(LOGIN_PATH)?)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .build()?;

        let response = self.send(request).await?;
        let body: SessionResponse = decode(response).await?;

        let user = self.inner.start_session(body).await?;
        tracing::info!(user_id = %user.id, "Logged in");

        Ok(user)
    }

    /// End the session locally. The server call that expires the refresh cookie is
    /// best effort.
    pub async fn logout(&self) -> Result<(), SessionError> {
        match self.inner.url(LOGOUT_PATH) {
            Ok(url) => {
                if let Err(e) = self.inner.http.post(url).send().await {
                    tracing::warn!(error = %e, "Logout request failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Cannot build logout URL"),
        }

        self.inner.end_session().await
    }

    /// Send a request with the current access token attached.
    ///
    /// On `401` the request is retried once: with the current token if it changed
    /// while the request was in flight, otherwise with the token from a (shared)
    /// refresh. Login and refresh requests are sent untouched. Requests with a
    /// streaming body cannot be cloned and are not retried.
    ///
    /// # Errors
    /// * `Unauthorized` - The refresh failed; the session has been cleared
    /// * `Transport` - The API could not be reached
    pub async fn send(&self, request: Request) -> Result<Response, SessionError> {
        if is_token_endpoint(request.url()) {
            return Ok(self.inner.http.execute(request).await?);
        }

        let retry = request.try_clone();
        let sent_token = self.inner.access_token().await;
        let response = self
            .inner
            .http
            .execute(with_bearer(request, sent_token.as_deref())?)
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let Some(retry) = retry else {
            return Ok(response);
        };

        let token = self.renew(sent_token).await?;

        tracing::debug!(url = %retry.url(), "Retrying request with renewed access token");
        Ok(self
            .inner
            .http
            .execute(with_bearer(retry, Some(&token))?)
            .await?)
    }

    /// Obtain a new access token using the refresh cookie.
    ///
    /// Concurrent callers share one in-flight refresh and all receive its
    /// outcome. Any failure ends the session and yields `Unauthorized`.
    pub async fn refresh(&self) -> Result<String, SessionError> {
        let current = self.inner.access_token().await;
        self.renew(current).await
    }

    /// Replace `stale`, the token a rejected request was sent with.
    ///
    /// Decided under the slot lock: join the in-flight refresh if there is one,
    /// reuse the current token if it already differs from `stale`, otherwise
    /// start a refresh.
    async fn renew(&self, stale: Option<String>) -> Result<String, SessionError> {
        let refresh = {
            let mut slot = self.inner.refresh_slot.lock().await;
            match slot.as_ref() {
                Some(in_flight) => in_flight.clone(),
                None => match (stale, self.inner.access_token().await) {
                    (stale, Some(current)) if stale.as_deref() != Some(current.as_str()) => {
                        return Ok(current);
                    }
                    // Logged out while the request was in flight
                    (Some(_), None) => return Err(SessionError::Unauthorized),
                    _ => {
                        let refresh = spawn_refresh(Arc::clone(&self.inner));
                        *slot = Some(refresh.clone());
                        refresh
                    }
                },
            }
        };

        refresh.await
    }

    pub async fn list_users(&self, params: &ListUsersParams) -> Result<Page<User>, SessionError> {
        let request = self
            .inner
            .http
            .get(self.inner.url("users")?)
            .query(params)
            .build()?;
        decode(self.send(request).await?).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, SessionError> {
        let request = self
            .inner
            .http
            .get(self.inner.url(&format!("users/{}", id))?)
            .build()?;
        decode(self.send(request).await?).await
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<User, SessionError> {
        self.send_json(Method::POST, "users", user).await
    }

    pub async fn update_user(&self, id: &str, update: &UpdateUser) -> Result<User, SessionError> {
        self.send_json(Method::PATCH, &format!("users/{}", id), update)
            .await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, SessionError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .inner
            .http
            .request(method, self.inner.url(path)?)
            .json(body)
            .build()?;
        decode(self.send(request).await?).await
    }

    pub fn current_user(&self) -> Option<User> {
        match &*self.inner.state.borrow() {
            SessionState::LoggedIn(user) => Some(user.clone()),
            SessionState::LoggedOut => None,
        }
    }
}

impl Inner {
    fn url(&self, path: &str) -> Result<Url, SessionError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| SessionError::InvalidRequest(e.to_string()))
    }

    async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    async fn start_session(&self, body: SessionResponse) -> Result<User, SessionError> {
        let session = PersistedSession {
            access_token: body.access_token,
            user: body.user,
        };

        let user = session.user.clone();
        *self.session.write().await = Some(session.clone());
        self.state.send_replace(SessionState::LoggedIn(user.clone()));

        self.store.save(&session).await?;
        Ok(user)
    }

    async fn end_session(&self) -> Result<(), SessionError> {
        *self.session.write().await = None;
        self.state.send_replace(SessionState::LoggedOut);
        self.store.clear().await
    }

    async fn request_refresh(&self) -> Result<SessionResponse, SessionError> {
        let response = self.http.post(self.url(REFRESH_PATH)?).send().await?;
        decode(response).await
    }

    /// Run one refresh round trip and apply its outcome to the session.
    async fn refresh_session(&self) -> Result<String, SessionError> {
        let outcome =
            match tokio::time::timeout(self.config.refresh_timeout, self.request_refresh()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SessionError::Transport("refresh timed out".to_string())),
            };

        match outcome {
            Ok(body) => {
                let token = body.access_token.clone();
                if let Err(e) = self.start_session(body).await {
                    tracing::warn!(error = %e, "Failed to persist refreshed session");
                }
                tracing::debug!("Access token refreshed");
                Ok(token)
            }
            Err(e) => {
                tracing::info!(error = %e, "Refresh failed, ending session");
                if let Err(e) = self.end_session().await {
                    tracing::warn!(error = %e, "Failed to clear persisted session");
                }
                Err(SessionError::Unauthorized)
            }
        }
    }
}

/// Start a refresh on its own task so that a caller dropping its future cannot
/// cancel it. The task empties the slot once the outcome has been applied.
fn spawn_refresh(inner: Arc<Inner>) -> SharedRefresh {
    let task = tokio::spawn(async move {
        let outcome = inner.refresh_session().await;
        inner.refresh_slot.lock().await.take();
        outcome
    });

    async move {
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Refresh task failed");
                Err(SessionError::Unauthorized)
            }
        }
    }
    .boxed()
    .shared()
}

fn is_token_endpoint(url: &Url) -> bool {
    let path = url.path().trim_end_matches('/');
    path.ends_with(LOGIN_PATH) || path.ends_with(REFRESH_PATH)
}

fn with_bearer(mut request: Request, token: Option<&str>) -> Result<Request, SessionError> {
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| SessionError::InvalidRequest(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    Ok(request)
}

/// Decode a success body, or turn an error response into a [`SessionError`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SessionError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| SessionError::Decode(e.to_string()));
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };

    Err(SessionError::Api {
        status: status.as_u16(),
        message,
    })
}
