//! HTTP error responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::resilience::RateLimitDecision;
use crate::Error;

/// JSON error body: `{ error, details?, suggestion? }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            suggestion: None,
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

pub enum ApiError {
    Relay(Error),
    RateLimited(RateLimitDecision),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Relay(err)
    }
}

impl ApiError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::RateLimited(d) => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody::new("Too many requests")
                    .details(format!("Limit of {} requests per window exceeded", d.limit)),
            ),
            ApiError::Relay(err) => match err {
                Error::Validation { message, context } => {
                    let mut body = ErrorBody::new(message);
                    if let Some(field) = context.field_path {
                        body = body.details(format!("field: {}", field));
                    }
                    (StatusCode::BAD_REQUEST, body)
                }
                Error::Serialization(e) => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("Invalid request body").details(e.to_string()),
                ),
                Error::MissingApiKey => (
                    StatusCode::UNAUTHORIZED,
                    ErrorBody::new("OpenRouter API key is not configured").suggestion(
                        "Set OPENROUTER_API_KEY on the server or send the X-OpenRouter-Key header",
                    ),
                ),
                Error::Remote { status, message } => (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    ErrorBody::new(message),
                ),
                Error::LocalUnavailable { endpoint, details } => {
                    warn!(endpoint = %endpoint, "local backend refused connection");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        ErrorBody::new("LM Studio is not running")
                            .details(details)
                            .suggestion(format!(
                                "Start LM Studio, load a model and enable its local server at {}",
                                endpoint
                            )),
                    )
                }
                Error::LocalFailed { details } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Failed to get a response from LM Studio").details(details),
                ),
                Error::MaxToolIterations { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Maximum tool iterations reached"),
                ),
                Error::Transport(e) => {
                    error!(error = %e, "upstream transport failure");
                    (
                        StatusCode::BAD_GATEWAY,
                        ErrorBody::new("Failed to reach the model provider").details(e.to_string()),
                    )
                }
                other => {
                    error!(error = %other, "chat request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorBody::new("Internal server error").details(other.to_string()),
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let rate_headers = match &self {
            ApiError::RateLimited(d) => Some(d.clone()),
            ApiError::Relay(_) => None,
        };
        let (status, body) = self.status_and_body();
        let mut response = (status, Json(body)).into_response();

        if let Some(d) = rate_headers {
            let headers = response.headers_mut();
            let pairs = [
                ("x-ratelimit-limit", d.limit.to_string()),
                ("x-ratelimit-remaining", d.remaining.to_string()),
                ("x-ratelimit-reset", d.reset_at.to_rfc3339()),
                (header::RETRY_AFTER.as_str(), d.retry_after_secs().to_string()),
            ];
            for (name, value) in pairs {
                if let Ok(value) = HeaderValue::from_str(&value) {
                    headers.insert(name, value);
                }
            }
        }
        response
    }
}
