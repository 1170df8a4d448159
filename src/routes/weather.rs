//! Weather HTTP endpoint.
//!
//! - GET /api/weather?lat=<float>&lon=<float>

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::AppError;
use crate::services::normalize::{build_weather_data, WeatherData};
use crate::services::owm::OwmClient;

/// Shared caching directive on successful responses: 10 minutes shared
/// cache with a 5-minute stale-while-revalidate window.
const WEATHER_CACHE_CONTROL: &str = "s-maxage=600, stale-while-revalidate=300";

/// Shared application state for API endpoints.
#[derive(Clone)]
pub struct AppState {
    pub owm: OwmClient,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeatherQuery {
    /// Latitude as a decimal degree (e.g. 47.37)
    pub lat: Option<String>,
    /// Longitude as a decimal degree (e.g. 8.54)
    pub lon: Option<String>,
}

/// Both parameters are required and must parse as finite numbers.
fn parse_coords(params: &WeatherQuery) -> Result<(f64, f64), AppError> {
    let parsed = params
        .lat
        .as_deref()
        .zip(params.lon.as_deref())
        .and_then(|(lat, lon)| Some((lat.parse::<f64>().ok()?, lon.parse::<f64>().ok()?)))
        .filter(|(lat, lon)| lat.is_finite() && lon.is_finite());

    parsed.ok_or_else(|| {
        AppError::BadRequest("Valid lat and lon query parameters are required".to_string())
    })
}

/// Get the normalized weather snapshot for a location.
///
/// Proxies OpenWeatherMap (current conditions + 3-hour forecast list,
/// fetched concurrently) and returns the compact current/hourly/daily model.
#[utoipa::path(
    get,
    path = "/api/weather",
    tag = "Weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Normalized weather snapshot", body = WeatherData,
         headers(
             ("Cache-Control" = String, description = "Shared caching directive (10 min, 5 min stale-while-revalidate)")
         )),
        (status = 400, description = "Missing or non-numeric lat/lon", body = crate::errors::ErrorResponse),
        (status = 500, description = "Upstream API key not configured", body = crate::errors::ErrorResponse),
        (status = 502, description = "Upstream unreachable or non-success", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<(HeaderMap, Json<WeatherData>), AppError> {
    let (lat, lon) = parse_coords(&params)?;

    let (current, forecast) = state.owm.fetch_bundle(lat, lon).await?;
    let data = build_weather_data(&current, &forecast.list);

    let mut headers = HeaderMap::new();
    if let Ok(value) = WEATHER_CACHE_CONTROL.parse() {
        headers.insert(header::CACHE_CONTROL, value);
    }

    Ok((headers, Json(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query(lat: Option<&str>, lon: Option<&str>) -> Query<WeatherQuery> {
        Query(WeatherQuery {
            lat: lat.map(str::to_string),
            lon: lon.map(str::to_string),
        })
    }

    fn state_for(base_url: &str, api_key: Option<&str>) -> State<AppState> {
        State(AppState {
            owm: OwmClient::new(base_url, api_key.map(str::to_string)),
        })
    }

    async fn mock_upstream() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Zurich",
                "main": { "temp": 71.6, "feels_like": 70.2, "humidity": 58 },
                "weather": [ { "description": "clear sky", "icon": "01d" } ],
                "wind": { "speed": 4.6 }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [
                    {
                        "dt": 1_700_000_000,
                        "main": { "temp": 68.3, "temp_max": 70.1, "temp_min": 66.0 },
                        "weather": [ { "description": "few clouds", "icon": "02d" } ]
                    }
                ]
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_non_numeric_lat_is_400() {
        let result = get_weather(state_for("http://localhost:1", Some("k")), query(Some("abc"), Some("10"))).await;
        let status = result.unwrap_err().into_response().status();
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_missing_lon_is_400() {
        let result = get_weather(state_for("http://localhost:1", Some("k")), query(Some("47.3"), None)).await;
        let status = result.unwrap_err().into_response().status();
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_nan_lat_is_400() {
        let result = get_weather(state_for("http://localhost:1", Some("k")), query(Some("NaN"), Some("10"))).await;
        let status = result.unwrap_err().into_response().status();
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_missing_credential_is_500() {
        let result = get_weather(state_for("http://localhost:1", None), query(Some("47.3"), Some("8.5"))).await;
        let status = result.unwrap_err().into_response().status();
        assert_eq!(status, 500);
    }

    #[tokio::test]
    async fn test_upstream_500_is_502() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = get_weather(state_for(&server.uri(), Some("k")), query(Some("47.3"), Some("8.5"))).await;
        let status = result.unwrap_err().into_response().status();
        assert_eq!(status, 502);
    }

    #[tokio::test]
    async fn test_success_returns_normalized_snapshot_with_cache_header() {
        let server = mock_upstream().await;

        let (headers, Json(data)) = get_weather(
            state_for(&server.uri(), Some("k")),
            query(Some("47.37"), Some("8.54")),
        )
        .await
        .unwrap();

        assert_eq!(
            headers.get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some(WEATHER_CACHE_CONTROL)
        );
        assert_eq!(data.current.temp, 72);
        assert_eq!(data.current.location_name, "Zurich");
        assert_eq!(data.hourly.len(), 1);
        assert_eq!(data.hourly[0].icon, "02d");
    }
}
