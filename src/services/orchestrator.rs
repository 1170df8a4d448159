//! Weather fetch orchestration.
//!
//! Drives the widget's lifecycle: one-shot location acquisition, fetches
//! against the weather endpoint, categorized errors, manual refresh, and a
//! periodic auto-refresh timer.
//!
//! State machine: `Idle → Locating → Fetching → (Ready | Failed)`, with
//! `Refreshing` re-entered from `Ready` on timer or manual trigger. State
//! lives behind `Arc<RwLock<_>>`; overlapping refreshes are not
//! de-duplicated, so the last response to resolve wins.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::errors::WeatherError;
use crate::services::location::{Coordinates, LocationError, LocationProvider};
use crate::services::normalize::WeatherData;

/// Interval between automatic refetches while coordinates are known.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Where the orchestrator currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Locating,
    Fetching,
    /// A refetch while a previous snapshot is still on display.
    Refreshing,
    Ready,
    Failed,
}

/// Observable orchestrator state, cloned out for the presentation layer.
#[derive(Debug, Clone)]
pub struct WeatherState {
    pub phase: Phase,
    /// Latest normalized snapshot. Retained across failed refreshes.
    pub data: Option<WeatherData>,
    pub error: Option<WeatherError>,
    /// Session-cached coordinates; location is requested at most once
    /// per successful acquisition.
    pub coords: Option<Coordinates>,
}

impl WeatherState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            data: None,
            error: None,
            coords: None,
        }
    }
}

type SharedWeatherState = Arc<RwLock<WeatherState>>;

/// Normalized fetch contract against the weather endpoint.
#[async_trait]
pub trait WeatherApi: Send + Sync + 'static {
    async fn fetch(&self, coords: Coordinates) -> Result<WeatherData, WeatherError>;
}

/// `WeatherApi` over HTTP, hitting `GET {base}/api/weather`.
#[derive(Debug, Clone)]
pub struct HttpWeatherApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWeatherApi {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[async_trait]
impl WeatherApi for HttpWeatherApi {
    async fn fetch(&self, coords: Coordinates) -> Result<WeatherData, WeatherError> {
        let url = format!(
            "{}/api/weather?lat={}&lon={}",
            self.base_url, coords.lat, coords.lon
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| WeatherError::network())?;

        if !response.status().is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Failed to fetch weather data".to_string());
            return Err(WeatherError::api(message));
        }

        response
            .json::<WeatherData>()
            .await
            .map_err(|_| WeatherError::api("Failed to fetch weather data"))
    }
}

/// Coordinates location acquisition, fetch, retry, and periodic refresh.
pub struct WeatherOrchestrator {
    location: Arc<dyn LocationProvider>,
    api: Arc<dyn WeatherApi>,
    state: SharedWeatherState,
    refresh_task: Option<JoinHandle<()>>,
}

impl WeatherOrchestrator {
    pub fn new(location: Arc<dyn LocationProvider>, api: Arc<dyn WeatherApi>) -> Self {
        Self {
            location,
            api,
            state: Arc::new(RwLock::new(WeatherState::new())),
            refresh_task: None,
        }
    }

    /// Snapshot of the current state for rendering.
    pub async fn state(&self) -> WeatherState {
        self.state.read().await.clone()
    }

    /// Request device location once, then fetch. Permission denial parks the
    /// machine in `Failed` with no retry affordance; other location failures
    /// allow an explicit retry.
    pub async fn activate(&self) {
        self.state.write().await.phase = Phase::Locating;

        match self.location.current_position().await {
            Ok(coords) => {
                self.state.write().await.coords = Some(coords);
                fetch_and_store(&self.api, &self.state, coords).await;
            }
            Err(LocationError::PermissionDenied) => {
                let mut state = self.state.write().await;
                state.error = Some(WeatherError::geolocation_denied());
                state.phase = Phase::Failed;
            }
            Err(LocationError::Unavailable) => {
                let mut state = self.state.write().await;
                state.error = Some(WeatherError::geolocation_unavailable());
                state.phase = Phase::Failed;
            }
        }
    }

    /// Explicit user-driven retry. Re-fetches when coordinates are already
    /// cached, otherwise re-attempts location acquisition from scratch.
    pub async fn retry(&self) {
        let coords = self.state.read().await.coords;
        match coords {
            Some(coords) => fetch_and_store(&self.api, &self.state, coords).await,
            None => self.activate().await,
        }
    }

    /// Manual refresh. Only meaningful once coordinates are known; a call
    /// while another fetch is in flight is allowed to overlap.
    pub async fn refresh(&self) {
        let coords = self.state.read().await.coords;
        if let Some(coords) = coords {
            fetch_and_store(&self.api, &self.state, coords).await;
        }
    }

    /// Spawn the periodic refresh task. A second call while one is running
    /// is a no-op, so lifecycle churn cannot stack duplicate timers.
    pub fn start_auto_refresh(&mut self) {
        if self.refresh_task.is_some() {
            return;
        }

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        self.refresh_task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(REFRESH_INTERVAL).await;
                let coords = state.read().await.coords;
                if let Some(coords) = coords {
                    tracing::debug!("Auto-refreshing weather for {:?}", coords);
                    fetch_and_store(&api, &state, coords).await;
                }
            }
        }));
    }

    /// Tear the periodic refresh task down.
    pub fn stop_auto_refresh(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
    }

    pub fn auto_refresh_active(&self) -> bool {
        self.refresh_task.is_some()
    }
}

impl Drop for WeatherOrchestrator {
    fn drop(&mut self) {
        self.stop_auto_refresh();
    }
}

/// One fetch against the endpoint, writing the outcome into shared state.
///
/// No request-generation guard: when fetches overlap, whichever response
/// resolves last overwrites the snapshot.
async fn fetch_and_store(
    api: &Arc<dyn WeatherApi>,
    state: &SharedWeatherState,
    coords: Coordinates,
) {
    {
        let mut state = state.write().await;
        state.phase = if state.phase == Phase::Ready && state.data.is_some() {
            Phase::Refreshing
        } else {
            Phase::Fetching
        };
    }

    match api.fetch(coords).await {
        Ok(data) => {
            let mut state = state.write().await;
            state.data = Some(data);
            state.error = None;
            state.phase = Phase::Ready;
        }
        Err(e) => {
            tracing::warn!("Weather fetch failed: {} ({:?})", e.message, e.code);
            let mut state = state.write().await;
            state.error = Some(e);
            state.phase = Phase::Failed;
        }
    }
}
