//! OpenWeatherMap client.
//!
//! Fetches current conditions and the 5-day / 3-hour forecast list.
//! See: https://openweathermap.org/api
//!
//! The raw schema stays private to this module and `normalize`; everything
//! downstream consumes the normalized `WeatherData` model.

use serde::Deserialize;

use crate::errors::AppError;

/// Error message returned when the upstream credential is absent.
const MSG_KEY_NOT_CONFIGURED: &str = "OpenWeatherMap API key not configured";
/// Error message for non-success upstream responses.
const MSG_UPSTREAM_FAILED: &str = "Failed to fetch weather data";
/// Error message for network failures reaching the upstream.
const MSG_UPSTREAM_NETWORK: &str = "Network error fetching weather data";

/// Client for the OpenWeatherMap data API.
#[derive(Debug, Clone)]
pub struct OwmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

// --- OpenWeatherMap JSON response types ---

#[derive(Debug, Clone, Deserialize)]
pub struct OwmCondition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct OwmCurrentMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: i64,
}

#[derive(Debug, Deserialize)]
pub struct OwmWind {
    pub speed: f64,
}

/// Raw current-conditions payload (`/weather`).
#[derive(Debug, Deserialize)]
pub struct OwmCurrentResponse {
    pub name: String,
    pub main: OwmCurrentMain,
    pub weather: Vec<OwmCondition>,
    pub wind: OwmWind,
}

#[derive(Debug, Deserialize)]
pub struct OwmForecastMain {
    pub temp: f64,
    pub temp_max: f64,
    pub temp_min: f64,
}

/// One 3-hour-interval entry of the forecast list.
#[derive(Debug, Deserialize)]
pub struct OwmForecastEntry {
    /// Unix timestamp (UTC seconds) of the forecast slot.
    pub dt: i64,
    pub main: OwmForecastMain,
    pub weather: Vec<OwmCondition>,
}

/// Raw forecast payload (`/forecast`).
#[derive(Debug, Deserialize)]
pub struct OwmForecastResponse {
    pub list: Vec<OwmForecastEntry>,
}

impl OwmClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Whether an API key is configured (health reporting).
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// The configured API key, or a `Config` error when it is missing.
    fn credential(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Config(MSG_KEY_NOT_CONFIGURED.to_string()))
    }

    /// Fetch current conditions and the forecast list concurrently.
    ///
    /// The credential is validated once before any request goes out, so a
    /// missing key surfaces as a 500 rather than an upstream 502.
    pub async fn fetch_bundle(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<(OwmCurrentResponse, OwmForecastResponse), AppError> {
        self.credential()?;
        futures::try_join!(self.fetch_current(lat, lon), self.fetch_forecast(lat, lon))
    }

    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Result<OwmCurrentResponse, AppError> {
        self.get_json("weather", lat, lon).await
    }

    pub async fn fetch_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<OwmForecastResponse, AppError> {
        self.get_json("forecast", lat, lon).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        lat: f64,
        lon: f64,
    ) -> Result<T, AppError> {
        let key = self.credential()?;
        let url = format!(
            "{}/{}?lat={}&lon={}&appid={}&units=imperial",
            self.base_url, path, lat, lon, key
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!("OpenWeatherMap /{} request failed: {}", path, e);
            AppError::Upstream(MSG_UPSTREAM_NETWORK.to_string())
        })?;

        if !response.status().is_success() {
            tracing::warn!(
                "OpenWeatherMap /{} returned HTTP {}",
                path,
                response.status()
            );
            return Err(AppError::Upstream(MSG_UPSTREAM_FAILED.to_string()));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::warn!("OpenWeatherMap /{} JSON parse error: {}", path, e);
            AppError::Upstream(MSG_UPSTREAM_FAILED.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_current() -> serde_json::Value {
        serde_json::json!({
            "name": "Zurich",
            "main": { "temp": 71.6, "feels_like": 70.2, "humidity": 58 },
            "weather": [ { "description": "clear sky", "icon": "01d" } ],
            "wind": { "speed": 4.6 }
        })
    }

    fn sample_forecast() -> serde_json::Value {
        serde_json::json!({
            "list": [
                {
                    "dt": 1_700_000_000,
                    "main": { "temp": 68.3, "temp_max": 70.1, "temp_min": 66.0 },
                    "weather": [ { "description": "few clouds", "icon": "02d" } ]
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_fetch_bundle_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("appid", "k"))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_current()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
            .mount(&server)
            .await;

        let client = OwmClient::new(&server.uri(), Some("k".to_string()));
        let (current, forecast) = client.fetch_bundle(47.37, 8.54).await.unwrap();

        assert_eq!(current.name, "Zurich");
        assert_eq!(current.main.humidity, 58);
        assert_eq!(forecast.list.len(), 1);
        assert_eq!(forecast.list[0].weather[0].icon, "02d");
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let client = OwmClient::new("http://localhost:1", None);
        let err = client.fetch_bundle(0.0, 0.0).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_upstream_500_maps_to_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = OwmClient::new(&server.uri(), Some("k".to_string()));
        let err = client.fetch_bundle(47.37, 8.54).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_maps_to_upstream_error() {
        // Nothing listens on this port.
        let client = OwmClient::new("http://127.0.0.1:9", Some("k".to_string()));
        let err = client.fetch_current(47.37, 8.54).await.unwrap_err();
        match err {
            AppError::Upstream(msg) => assert!(msg.contains("Network error")),
            other => panic!("expected Upstream, got {:?}", other),
        }
    }
}
