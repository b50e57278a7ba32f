use axum::http::StatusCode;
use axum::http::header::ALLOW;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors returned by the relay's HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    Forbidden(String),
    MethodNotAllowed,
    RateLimited(u64),
    BadGateway(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::RateLimited(secs) => write!(f, "Rate limited. Retry after {secs}s"),
            AppError::BadGateway(msg) => write!(f, "Bad Gateway: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = match &self {
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::MethodNotAllowed => {
                let body = json!({ "error": message });
                return (
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(ALLOW, "POST")],
                    axum::Json(body),
                )
                    .into_response();
            }
            AppError::RateLimited(secs) => {
                let body = json!({ "error": message });
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [("Retry-After", secs.to_string())],
                    axum::Json(body),
                )
                    .into_response();
            }
            AppError::BadGateway(msg) => {
                tracing::error!("Upstream error: {msg}");
                StatusCode::BAD_GATEWAY
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Errors surfaced to the person filling in the survey.
///
/// Every variant renders as a readable message; none of them is fatal, the
/// user can fix the input or sign in and submit again.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// The remote endpoint was never configured, or configured with a bad URL.
    Configuration(String),
    Validation {
        field: Option<String>,
        message: String,
    },
    Transport {
        message: String,
        status: Option<u16>,
        raw: Option<serde_json::Value>,
    },
    /// No signed-in user.
    Authentication(String),
    /// A submission from this form is already in flight.
    Busy,
}

impl SubmitError {
    pub fn transport(message: impl Into<String>) -> Self {
        SubmitError::Transport {
            message: message.into(),
            status: None,
            raw: None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SubmitError::Configuration(msg) => msg,
            SubmitError::Validation { message, .. } => message,
            SubmitError::Transport { message, .. } => message,
            SubmitError::Authentication(msg) => msg,
            SubmitError::Busy => "A submission is already in progress",
        }
    }
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            SubmitError::Validation { message, .. } => write!(f, "Validation error: {message}"),
            SubmitError::Transport { message, .. } => write!(f, "Transport error: {message}"),
            SubmitError::Authentication(msg) => write!(f, "Authentication error: {msg}"),
            SubmitError::Busy => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Request to remote endpoint timed out".to_string()
        } else {
            format!("Request to remote endpoint failed: {err}")
        };
        SubmitError::Transport {
            message,
            status: err.status().map(|s| s.as_u16()),
            raw: None,
        }
    }
}
