//! Device location acquisition.
//!
//! The platform consent flow is out of scope; the seam is a one-shot
//! coordinate request behind a permission gate. The production provider is
//! configuration-backed; tests substitute doubles that deny or fail.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair, cached in memory for the session once acquired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Why a location request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    /// Consent refused. Not recoverable without the user changing settings.
    PermissionDenied,
    /// Timeout, hardware failure, or no provider configured. Retry allowed.
    Unavailable,
}

/// One-shot coordinate request.
#[async_trait]
pub trait LocationProvider: Send + Sync + 'static {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Provider backed by fixed configuration values.
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    coords: Option<Coordinates>,
}

impl StaticLocationProvider {
    pub fn new(lat: Option<f64>, lon: Option<f64>) -> Self {
        let coords = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        };
        Self { coords }
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.coords.ok_or(LocationError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_returns_configured_coords() {
        let provider = StaticLocationProvider::new(Some(47.37), Some(8.54));
        let coords = provider.current_position().await.unwrap();
        assert_eq!(coords, Coordinates { lat: 47.37, lon: 8.54 });
    }

    #[tokio::test]
    async fn test_static_provider_without_config_is_unavailable() {
        let provider = StaticLocationProvider::new(Some(47.37), None);
        assert_eq!(
            provider.current_position().await.unwrap_err(),
            LocationError::Unavailable
        );
    }
}
