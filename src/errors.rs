use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

/// Server-side error taxonomy for the weather endpoint.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

/// Categorized, user-facing error surfaced by the weather orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherError {
    pub message: String,
    pub code: WeatherErrorCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherErrorCode {
    GeolocationDenied,
    GeolocationUnavailable,
    ApiError,
    NetworkError,
}

impl WeatherError {
    pub fn geolocation_denied() -> Self {
        Self {
            message: "Location access was denied. Enable it in your browser settings.".to_string(),
            code: WeatherErrorCode::GeolocationDenied,
        }
    }

    pub fn geolocation_unavailable() -> Self {
        Self {
            message: "Unable to determine your location.".to_string(),
            code: WeatherErrorCode::GeolocationUnavailable,
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: WeatherErrorCode::ApiError,
        }
    }

    pub fn network() -> Self {
        Self {
            message: "Network error. Check your connection.".to_string(),
            code: WeatherErrorCode::NetworkError,
        }
    }

    /// Whether the UI should offer a retry action. Permission denial is
    /// only recoverable through OS settings, so it gets no retry affordance.
    pub fn retryable(&self) -> bool {
        self.code != WeatherErrorCode::GeolocationDenied
    }
}
