use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Message shown when the server gives no usable error text
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {}", or_generic(.0))]
    Unauthorized(Option<String>),

    #[error("Access denied: {}", or_generic(.0))]
    AccessDenied(Option<String>),

    #[error("Resource not found: {}", or_generic(.0))]
    NotFound(Option<String>),

    #[error("Rate limited - please wait before retrying")]
    RateLimited(Option<String>),

    #[error("Server error ({}): {}", .0, or_generic(.1))]
    ServerError(StatusCode, Option<String>),

    #[error("Request rejected ({}): {}", .0, or_generic(.1))]
    Rejected(StatusCode, Option<String>),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

fn or_generic(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE)
}

/// Error body shape used by the console API: `{"error": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Maximum length for a server message carried into an error
const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

impl ApiError {
    /// Pull the `error` field out of a JSON error body, if there is one.
    pub fn extract_message(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        let message = parsed.error?.trim().to_string();
        if message.is_empty() {
            return None;
        }
        Some(Self::truncate(message))
    }

    fn truncate(mut message: String) -> String {
        if message.len() > MAX_ERROR_MESSAGE_LENGTH {
            let mut cut = MAX_ERROR_MESSAGE_LENGTH;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
            message.push_str("...");
        }
        message
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited(message),
            500..=599 => ApiError::ServerError(status, message),
            _ => ApiError::Rejected(status, message),
        }
    }

    /// Message the server put in the error body
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(m)
            | ApiError::AccessDenied(m)
            | ApiError::NotFound(m)
            | ApiError::RateLimited(m)
            | ApiError::ServerError(_, m)
            | ApiError::Rejected(_, m) => m.as_deref(),
            ApiError::NetworkError(_) | ApiError::InvalidResponse(_) => None,
        }
    }

    /// Text for a user-facing notification
    pub fn user_message(&self) -> &str {
        self.server_message().unwrap_or(GENERIC_FAILURE_MESSAGE)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_variants() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized(None)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, ""),
            ApiError::AccessDenied(None)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(None)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited(None)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(StatusCode::BAD_GATEWAY, None)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, ""),
            ApiError::Rejected(StatusCode::BAD_REQUEST, None)
        ));
    }

    #[test]
    fn test_server_message_from_error_body() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, r#"{"error":"forbidden"}"#);
        assert_eq!(err.server_message(), Some("forbidden"));
        assert_eq!(err.user_message(), "forbidden");
        assert!(err.to_string().contains("forbidden"));
    }

    #[test]
    fn test_missing_message_falls_back_to_generic() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.server_message(), None);
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);

        // Non-JSON and blank messages are ignored too
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":"  "}"#);
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_long_message_truncated() {
        let body = serde_json::json!({ "error": "x".repeat(2000) }).to_string();
        let message = ApiError::extract_message(&body).unwrap();
        assert_eq!(message.len(), MAX_ERROR_MESSAGE_LENGTH + 3);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_display_includes_status_and_message() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, r#"{"error":"upstream down"}"#);
        assert_eq!(err.to_string(), "Server error (502 Bad Gateway): upstream down");

        let err = ApiError::from_status(StatusCode::CONFLICT, "");
        assert_eq!(err.to_string(), "Request rejected (409 Conflict): Request failed");
    }
}
