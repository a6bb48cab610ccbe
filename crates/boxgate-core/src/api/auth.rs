//! Authentication endpoints of the console API.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiClient, ApiError};
use crate::auth::{AuthBackend, Credentials};

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const PASSWORD_PATH: &str = "/auth/password";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
struct ChangePasswordRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

/// Typed wrapper over the `/auth` endpoints.
#[derive(Clone)]
pub struct AuthApi {
    api: ApiClient,
}

impl AuthApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /auth/login`. Never carries the current token, so a rejected
    /// password cannot be mistaken for an expired session.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        debug!(username = %credentials.username, "Authenticating");
        self.api.post_anonymous(LOGIN_PATH, credentials).await
    }

    /// `POST /auth/logout`
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.api.send(self.api.request(Method::POST, LOGOUT_PATH)).await
    }

    /// `PUT /auth/password`
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let body = ChangePasswordRequest {
            old_password,
            new_password,
        };
        self.api
            .send(self.api.request(Method::PUT, PASSWORD_PATH).json(&body))
            .await
    }
}

impl AuthBackend for AuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        AuthApi::login(self, credentials).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        AuthApi::logout(self).await
    }
}
