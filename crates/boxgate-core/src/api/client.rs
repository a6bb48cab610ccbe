//! Authorized transport for the console REST API.
//!
//! Every call goes through two ordered stages wrapped around a plain
//! `reqwest::Client`:
//!
//! 1. `authorize` attaches `Authorization: Bearer <token>` when the session
//!    holds a token, and leaves the request alone otherwise.
//! 2. `classify` sorts the response into an [`Outcome`]; `settle` then applies
//!    the side effects (forced logout + redirect, or a user notification) and
//!    hands the caller a `Result`.
//!
//! Nothing here retries. A rejected token would only be rejected again, and
//! retry policy for other failures belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::notify::Notifier;
use super::ApiError;
use crate::auth::Session;
use crate::router::{Redirect, LOGIN_PATH};

// ============================================================================
// Constants
// ============================================================================

/// Path prefix shared by every console API endpoint
pub const API_PREFIX: &str = "/api/v1";

/// HTTP request timeout in seconds, applied to every call
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Result of the response stage
#[derive(Debug)]
pub enum Outcome {
    /// 2xx response, passed through untouched
    Success(Response),
    /// The server rejected the credentials this request carried
    AuthError(ApiError),
    /// Any other failure, including transport errors
    OtherError(ApiError),
}

/// HTTP client that enforces the session's authorization contract.
/// Clone is cheap - the reqwest client and collaborators are reference counted.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    login_path: String,
    session: Arc<Session>,
    redirect: Arc<dyn Redirect>,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    /// Create a client for the console at `server_url` (scheme, host and port).
    pub fn new(
        server_url: &str,
        timeout: Duration,
        session: Arc<Session>,
        redirect: Arc<dyn Redirect>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: format!("{}{}", server_url.trim_end_matches('/'), API_PREFIX),
            login_path: LOGIN_PATH.to_string(),
            session,
            redirect,
            notifier,
        })
    }

    /// Redirect target for forced logouts, when the route table uses a
    /// different login path
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Absolute URL for an API path such as `/auth/login`
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Start a request against an API path. Credentials are attached when it
    /// is executed, not here.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Run a request through both stages.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        self.dispatch(builder, true).await
    }

    /// Run a request without attaching the session token, for endpoints that
    /// authenticate by other means (login). A 401 here is never a session
    /// failure.
    pub async fn execute_anonymous(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        self.dispatch(builder, false).await
    }

    async fn dispatch(
        &self,
        builder: RequestBuilder,
        with_credentials: bool,
    ) -> Result<Response, ApiError> {
        let mut request = match builder.build() {
            Ok(request) => request,
            Err(e) => return self.settle(Outcome::OtherError(e.into())),
        };

        let carried_credentials = with_credentials && self.authorize(&mut request);
        debug!(
            method = %request.method(),
            url = %request.url(),
            authorized = carried_credentials,
            "Sending request"
        );

        let result = self.client.execute(request).await;
        let outcome = Self::classify(result, carried_credentials).await;
        self.settle(outcome)
    }

    /// Execute and discard the response body
    pub async fn send(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.execute(builder).await.map(drop)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        Self::decode(response, path).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::POST, path).json(body))
            .await?;
        Self::decode(response, path).await
    }

    /// POST without the session token
    pub async fn post_anonymous<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute_anonymous(self.request(Method::POST, path).json(body))
            .await?;
        Self::decode(response, path).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::PUT, path).json(body))
            .await?;
        Self::decode(response, path).await
    }

    // ===== Request stage =====

    /// Attach the bearer token if there is one. Returns whether credentials
    /// were attached.
    fn authorize(&self, request: &mut Request) -> bool {
        let token = self.session.token();
        if token.is_empty() {
            return false;
        }

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(header::AUTHORIZATION, value);
                true
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Session token is not a valid header value, sending unauthenticated"
                );
                false
            }
        }
    }

    // ===== Response stage =====

    /// Sort a response (or transport failure) into an outcome.
    ///
    /// A 401 only counts as a session failure when the request carried a
    /// token; an unauthenticated 401 (a rejected login) is an ordinary error.
    async fn classify(
        result: Result<Response, reqwest::Error>,
        carried_credentials: bool,
    ) -> Outcome {
        let response = match result {
            Ok(response) => response,
            Err(e) => return Outcome::OtherError(ApiError::NetworkError(e)),
        };

        let status = response.status();
        if status.is_success() {
            return Outcome::Success(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, &body);

        if status == StatusCode::UNAUTHORIZED && carried_credentials {
            Outcome::AuthError(error)
        } else {
            Outcome::OtherError(error)
        }
    }

    /// Apply the outcome's side effects and convert it for the caller.
    fn settle(&self, outcome: Outcome) -> Result<Response, ApiError> {
        match outcome {
            Outcome::Success(response) => Ok(response),
            Outcome::AuthError(error) => {
                self.force_logout();
                Err(error)
            }
            Outcome::OtherError(error) => {
                debug!(error = %error, "Request failed");
                self.notifier.error(error.user_message());
                Err(error)
            }
        }
    }

    fn force_logout(&self) {
        warn!(login_path = %self.login_path, "Session rejected by server, forcing logout");
        self.session.clear();
        self.redirect.redirect(&self.login_path);
    }

    async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(path, error = %e, "Failed to parse response");
            ApiError::InvalidResponse(format!("{}: {}", path, e))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
