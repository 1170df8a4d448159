//! Normalization of raw OpenWeatherMap payloads into the compact
//! current / hourly / daily model served by `/api/weather`.
//!
//! Everything in this module is pure (no I/O). Temperatures are rounded to
//! whole degrees here; no fractional precision survives past this boundary.

use chrono::{Datelike, TimeZone};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::owm::{OwmCondition, OwmCurrentResponse, OwmForecastEntry};

/// Number of upcoming hourly points kept in the snapshot.
pub const HOURLY_COUNT: usize = 6;
/// Number of upcoming daily points kept, excluding the current day.
pub const DAILY_COUNT: usize = 5;

/// Normalized current conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    /// Temperature, whole degrees
    pub temp: i32,
    /// Feels-like temperature, whole degrees
    pub feels_like: i32,
    /// Condition label (e.g. "clear sky")
    pub description: String,
    /// Provider icon code (e.g. "01d")
    pub icon: String,
    /// Relative humidity percentage, passed through unchanged
    pub humidity: i64,
    /// Wind speed, rounded to a whole unit
    pub wind_speed: i32,
    /// Location name reported by the provider
    pub location_name: String,
}

/// One upcoming hourly point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    /// Unix timestamp (UTC seconds) of the forecast slot
    pub time: i64,
    pub temp: i32,
    pub icon: String,
    pub description: String,
}

/// One upcoming daily point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    /// Unix timestamp (UTC seconds) of the day's first forecast entry
    pub date: i64,
    pub temp_high: i32,
    pub temp_low: i32,
    /// Icon of the day's first entry (not an aggregate)
    pub icon: String,
    /// Description of the day's first entry (not an aggregate)
    pub description: String,
}

/// Full normalized snapshot. Produced fresh on every successful fetch and
/// replaced wholesale — there is no partial-update path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub current: CurrentWeather,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
    /// Capture timestamp, Unix milliseconds
    pub fetched_at: i64,
}

fn round_whole(v: f64) -> i32 {
    v.round() as i32
}

/// First weather-condition label and icon. The provider always sends at
/// least one condition; degrade to empty strings rather than panic.
fn primary_condition(conditions: &[OwmCondition]) -> (String, String) {
    conditions
        .first()
        .map(|c| (c.icon.clone(), c.description.clone()))
        .unwrap_or_default()
}

pub fn normalize_current(raw: &OwmCurrentResponse) -> CurrentWeather {
    let (icon, description) = primary_condition(&raw.weather);
    CurrentWeather {
        temp: round_whole(raw.main.temp),
        feels_like: round_whole(raw.main.feels_like),
        description,
        icon,
        humidity: raw.main.humidity,
        wind_speed: round_whole(raw.wind.speed),
        location_name: raw.name.clone(),
    }
}

/// First `HOURLY_COUNT` entries in original array order, no re-sorting.
/// Shorter inputs yield shorter outputs.
pub fn normalize_hourly(list: &[OwmForecastEntry]) -> Vec<HourlyForecast> {
    list.iter()
        .take(HOURLY_COUNT)
        .map(|entry| {
            let (icon, description) = primary_condition(&entry.weather);
            HourlyForecast {
                time: entry.dt,
                temp: round_whole(entry.main.temp),
                icon,
                description,
            }
        })
        .collect()
}

/// Accumulator for one calendar day's forecast entries.
struct DayBucket {
    key: (i32, u32, u32),
    /// Timestamp of the day's first entry.
    dt: i64,
    icon: String,
    description: String,
    highs: Vec<f64>,
    lows: Vec<f64>,
}

/// Bucket entries by local calendar date, drop the first (current, partial)
/// day, keep the next `DAILY_COUNT`.
pub fn normalize_daily(list: &[OwmForecastEntry]) -> Vec<DailyForecast> {
    normalize_daily_in(list, &chrono::Local)
}

/// Timezone-generic day bucketing. The key is a calendar-component tuple
/// (year, month, day), not duration arithmetic, so daylight-saving
/// boundaries fall on the right side.
pub fn normalize_daily_in<Tz: TimeZone>(list: &[OwmForecastEntry], tz: &Tz) -> Vec<DailyForecast> {
    let mut buckets: Vec<DayBucket> = Vec::new();

    for entry in list {
        let Some(local) = tz.timestamp_opt(entry.dt, 0).earliest() else {
            continue;
        };
        let key = (local.year(), local.month(), local.day());

        let idx = match buckets.iter().position(|b| b.key == key) {
            Some(idx) => idx,
            None => {
                let (icon, description) = primary_condition(&entry.weather);
                buckets.push(DayBucket {
                    key,
                    dt: entry.dt,
                    icon,
                    description,
                    highs: Vec::new(),
                    lows: Vec::new(),
                });
                buckets.len() - 1
            }
        };

        buckets[idx].highs.push(entry.main.temp_max);
        buckets[idx].lows.push(entry.main.temp_min);
    }

    buckets
        .into_iter()
        .skip(1)
        .take(DAILY_COUNT)
        .map(|b| DailyForecast {
            date: b.dt,
            temp_high: round_whole(b.highs.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            temp_low: round_whole(b.lows.iter().copied().fold(f64::INFINITY, f64::min)),
            icon: b.icon,
            description: b.description,
        })
        .collect()
}

/// Assemble the full snapshot from the two raw upstream payloads.
pub fn build_weather_data(
    current: &OwmCurrentResponse,
    forecast: &[OwmForecastEntry],
) -> WeatherData {
    WeatherData {
        current: normalize_current(current),
        hourly: normalize_hourly(forecast),
        daily: normalize_daily(forecast),
        fetched_at: chrono::Utc::now().timestamp_millis(),
    }
}
