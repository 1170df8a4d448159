/// Placeholder value shipped in .env.example — treated as "no key configured".
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OpenWeatherMap API key. `None` when unset or still the placeholder;
    /// the weather endpoint reports this as a 500 at request time.
    pub owm_api_key: Option<String>,
    /// Base URL of the OpenWeatherMap API (overridable for tests).
    pub owm_base_url: String,
    pub port: u16,
    /// Path of the JSON file holding the persisted todo collection.
    pub todo_db_path: String,
    /// Fixed coordinates for the weather widget, when configured.
    pub weather_lat: Option<f64>,
    pub weather_lon: Option<f64>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let owm_api_key = std::env::var("OPENWEATHERMAP_API_KEY")
            .ok()
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY);

        Self {
            owm_api_key,
            owm_base_url: std::env::var("OWM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            todo_db_path: std::env::var("TODO_DB_PATH")
                .unwrap_or_else(|_| "./data/todos.json".to_string()),
            weather_lat: std::env::var("WEATHER_LAT").ok().and_then(|v| v.parse().ok()),
            weather_lon: std::env::var("WEATHER_LON").ok().and_then(|v| v.parse().ok()),
        }
    }
}
