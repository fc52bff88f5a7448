// Crate-wide error type

use crate::auth::AuthError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Google API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// True for errors reported by the remote service (as opposed to transport or local failures)
    pub fn is_remote(&self) -> bool {
        matches!(self, ApiError::Api { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convert a Google error response into a user-facing message
pub(crate) fn friendly_api_error(service: &str, status: StatusCode, body: &str) -> String {
    if body.contains("SERVICE_DISABLED") || body.contains("has not been used in project") {
        return format!(
            "{} API not enabled. Please enable it in your Google Cloud Console and re-login.",
            service
        );
    }

    if body.contains("invalid_grant") || body.contains("Token has been expired") {
        return format!("{} access expired. Please re-login to refresh permissions.", service);
    }

    if body.contains("insufficientPermissions") || body.contains("access denied") {
        return format!("{} permission denied. Please re-login to grant access.", service);
    }

    // Google APIs wrap errors as {"error": {"code": 400, "message": "..."}}
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = parsed
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return format!("{}: {}", service, message);
        }
    }

    match status {
        StatusCode::UNAUTHORIZED => format!("{} access expired. Please re-login.", service),
        StatusCode::FORBIDDEN => format!("{} access denied. Please re-login to grant permissions.", service),
        StatusCode::NOT_FOUND => format!("{} resource not found.", service),
        StatusCode::TOO_MANY_REQUESTS => "Too many requests. Please try again later.".to_string(),
        _ => format!("{} error ({})", service, status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendly_error_disabled_service() {
        let msg = friendly_api_error(
            "Calendar",
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":403,"message":"SERVICE_DISABLED"}}"#,
        );
        assert!(msg.starts_with("Calendar API not enabled"));
    }

    #[test]
    fn test_friendly_error_uses_google_message() {
        let msg = friendly_api_error(
            "Gmail",
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"Invalid id value"}}"#,
        );
        assert_eq!(msg, "Gmail: Invalid id value");
    }

    #[test]
    fn test_friendly_error_status_fallback() {
        assert_eq!(
            friendly_api_error("Calendar", StatusCode::NOT_FOUND, "Not Found"),
            "Calendar resource not found."
        );
        assert_eq!(
            friendly_api_error("Gmail", StatusCode::TOO_MANY_REQUESTS, ""),
            "Too many requests. Please try again later."
        );
    }

    #[test]
    fn test_remote_classification() {
        let err = ApiError::Api {
            status: 404,
            message: "gone".to_string(),
        };
        assert!(err.is_remote());
        assert_eq!(err.status(), Some(404));
        assert!(!ApiError::validation("bad").is_remote());
    }
}
