//! REST client module for the console API.
//!
//! This module provides the `ApiClient` transport, which attaches the
//! session's bearer token to every request and reacts to failures: a 401
//! forces a logout and a redirect to the login route, anything else raises
//! a user notification.

pub mod auth;
pub mod client;
pub mod error;
pub mod notify;

pub use auth::{AuthApi, LoginResponse};
pub use client::{ApiClient, Outcome, API_PREFIX, REQUEST_TIMEOUT_SECS};
pub use error::{ApiError, GENERIC_FAILURE_MESSAGE};
pub use notify::{NotificationLog, Notifier};
