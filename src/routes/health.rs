use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::weather::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" when fully configured, "degraded" when the
    /// weather upstream credential is missing)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether the OpenWeatherMap credential is configured
    pub weather_configured: bool,
}

/// Health check endpoint.
///
/// The todo store works regardless of configuration, so a missing upstream
/// credential degrades the service rather than failing it.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let weather_configured = state.owm.has_credential();

    Json(HealthResponse {
        status: if weather_configured {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        weather_configured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::owm::OwmClient;

    #[tokio::test]
    async fn test_degraded_without_credential() {
        let state = AppState {
            owm: OwmClient::new("http://localhost:1", None),
        };
        let Json(response) = health_check(State(state)).await;
        assert_eq!(response.status, "degraded");
        assert!(!response.weather_configured);
    }

    #[tokio::test]
    async fn test_ok_with_credential() {
        let state = AppState {
            owm: OwmClient::new("http://localhost:1", Some("k".to_string())),
        };
        let Json(response) = health_check(State(state)).await;
        assert_eq!(response.status, "ok");
        assert!(response.weather_configured);
    }
}
