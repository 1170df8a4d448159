// Todo Vibe v0.1
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use todo_vibe::config::AppConfig;
use todo_vibe::routes::weather::AppState;
use todo_vibe::services::location::{LocationProvider, StaticLocationProvider};
use todo_vibe::services::orchestrator::{
    HttpWeatherApi, Phase, WeatherApi, WeatherOrchestrator, WeatherState, REFRESH_INTERVAL,
};
use todo_vibe::services::owm::OwmClient;
use todo_vibe::store::storage::FileStorage;
use todo_vibe::store::todos::TodoStore;
use todo_vibe::{errors, routes, services};

/// Todo Vibe API — OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Todo Vibe API",
        version = "0.1.0",
        description = "Weather endpoint for the Todo Vibe widget. Proxies \
            OpenWeatherMap current conditions and the 3-hour forecast list into \
            a compact, integer-degree current/hourly/daily snapshot.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Normalized weather snapshot retrieval"),
    ),
    paths(routes::health::health_check, routes::weather::get_weather),
    components(
        schemas(
            routes::health::HealthResponse,
            services::normalize::WeatherData,
            services::normalize::CurrentWeather,
            services::normalize::HourlyForecast,
            services::normalize::DailyForecast,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_vibe=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    if config.owm_api_key.is_none() {
        tracing::warn!(
            "OPENWEATHERMAP_API_KEY is missing or still the placeholder; \
             /api/weather will answer 500 until it is configured"
        );
    }

    // Load the persisted todo collection once at startup. Corrupt or missing
    // data starts the collection empty.
    let todo_storage = Arc::new(FileStorage::new(&config.todo_db_path));
    let mut todo_store = TodoStore::new(todo_storage);
    todo_store.load().await;
    tracing::info!(
        "Loaded {} todos ({} remaining) from {}",
        todo_store.todos().len(),
        todo_store.remaining(),
        config.todo_db_path
    );

    // Create OpenWeatherMap client and shared application state
    let owm_client = OwmClient::new(&config.owm_base_url, config.owm_api_key.clone());
    let app_state = AppState { owm: owm_client };

    // Spawn the weather widget runtime when coordinates are configured.
    // It fetches through the local endpoint like any other client.
    if config.weather_lat.is_some() || config.weather_lon.is_some() {
        let provider: Arc<dyn LocationProvider> = Arc::new(StaticLocationProvider::new(
            config.weather_lat,
            config.weather_lon,
        ));
        let api: Arc<dyn WeatherApi> = Arc::new(HttpWeatherApi::new(&format!(
            "http://127.0.0.1:{}",
            config.port
        )));
        tokio::spawn(run_weather_widget(provider, api));
    }

    // CORS — read-only API, restrict methods to GET
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    // Build router
    let api_routes = Router::new()
        .route("/api/weather", get(routes::weather::get_weather))
        .route("/api/health", get(routes::health::health_check))
        .with_state(app_state);

    let app = Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server terminated unexpectedly");

    // Drain any queued fire-and-forget writes so the last mutation is on
    // disk before exit.
    if let Err(e) = todo_store.flush().await {
        tracing::error!("Failed to flush todos on shutdown: {}", e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

/// Headless weather widget: activate once, then let the 15-minute timer
/// refetch with the session-cached coordinates, logging each snapshot.
async fn run_weather_widget(location: Arc<dyn LocationProvider>, api: Arc<dyn WeatherApi>) {
    // Let the server bind before the first fetch goes out.
    tokio::time::sleep(Duration::from_secs(1)).await;

    let mut orchestrator = WeatherOrchestrator::new(location, api);
    orchestrator.activate().await;
    log_weather_state(&orchestrator.state().await);

    orchestrator.start_auto_refresh();
    // The orchestrator owns the refresh timer; keep it alive and report
    // each cycle's outcome.
    loop {
        tokio::time::sleep(REFRESH_INTERVAL).await;
        log_weather_state(&orchestrator.state().await);
    }
}

fn log_weather_state(state: &WeatherState) {
    match state.phase {
        Phase::Ready => {
            if let Some(data) = &state.data {
                tracing::info!(
                    "Weather in {}: {}°, {} (humidity {}%, wind {})",
                    data.current.location_name,
                    data.current.temp,
                    data.current.description,
                    data.current.humidity,
                    data.current.wind_speed
                );
            }
        }
        Phase::Failed => {
            if let Some(error) = &state.error {
                tracing::warn!(
                    "Weather widget failed: {} (retryable: {})",
                    error.message,
                    error.retryable()
                );
            }
        }
        _ => tracing::debug!("Weather widget phase: {:?}", state.phase),
    }
}
