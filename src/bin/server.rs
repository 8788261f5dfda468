use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use owm_geocode_rs::{GeocodeClient, LocationRecord, LookupOutcome, ResolvedLocation};

/// Server configuration
struct ServerConfig {
    port: u16,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        }
    }
}

/// Application state shared across all requests
#[derive(Clone)]
struct AppState {
    client: GeocodeClient,
    metrics: Arc<Metrics>,
}

/// Server metrics
struct Metrics {
    total_requests: AtomicU64,
    requests_in_flight: AtomicU64,
    start_time: Instant,
}

/// RAII guard for tracking in-flight requests
struct RequestGuard<'a>(&'a AtomicU64);

impl<'a> Drop for RequestGuard<'a> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,owm_geocode_rs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Read configuration from environment
    let config = ServerConfig::from_env();

    let client = GeocodeClient::from_env().context("Failed to initialize geocoding client")?;
    tracing::info!("Geocoding client initialized");

    // Build Axum app with routes
    let app = build_app(client);

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Build the Axum application with routes and middleware
fn build_app(client: GeocodeClient) -> Router {
    let metrics = Arc::new(Metrics {
        total_requests: AtomicU64::new(0),
        requests_in_flight: AtomicU64::new(0),
        start_time: Instant::now(),
    });

    let state = AppState { client, metrics };

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API routes
        .route("/api/geocode", post(geocode_single))
        .route("/api/geocode/batch", post(geocode_batch))
        .route("/api/metrics", get(get_metrics))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Resolve a single location
async fn geocode_single(
    State(state): State<AppState>,
    Json(request): Json<GeocodeRequest>,
) -> Result<Json<GeocodeResponse>, ApiError> {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);
    state
        .metrics
        .requests_in_flight
        .fetch_add(1, Ordering::Relaxed);

    // Ensure we decrement on exit
    let _guard = RequestGuard(&state.metrics.requests_in_flight);

    if request.location.is_empty() {
        return Err(ApiError::BadRequest("location cannot be empty".to_string()));
    }

    tracing::info!("Resolving location: {}", request.location);

    match state.client.lookup(&request.location).await {
        Ok(Some(record)) => Ok(Json(GeocodeResponse {
            success: true,
            data: record,
        })),
        Ok(None) => Err(ApiError::NotFound(format!(
            "No results found for: {}",
            request.location
        ))),
        Err(e) => {
            tracing::error!("Lookup error for {}: {}", request.location, e);
            Err(ApiError::Upstream(e.to_string()))
        }
    }
}

#[derive(Deserialize)]
struct GeocodeRequest {
    location: String,
}

#[derive(Serialize)]
struct GeocodeResponse {
    success: bool,
    data: LocationRecord,
}

/// Resolve an ordered batch of locations
async fn geocode_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchGeocodeRequest>,
) -> Result<Json<BatchGeocodeResponse>, ApiError> {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);
    state
        .metrics
        .requests_in_flight
        .fetch_add(1, Ordering::Relaxed);
    let _guard = RequestGuard(&state.metrics.requests_in_flight);

    if request.locations.is_empty() {
        return Err(ApiError::BadRequest(
            "locations cannot be empty".to_string(),
        ));
    }

    tracing::info!("Batch resolving {} locations", request.locations.len());

    let resolved = state.client.resolve_many(&request.locations).await;
    let results = resolved.iter().map(BatchEntry::from_resolved).collect();

    Ok(Json(BatchGeocodeResponse {
        success: true,
        results,
    }))
}

#[derive(Deserialize)]
struct BatchGeocodeRequest {
    locations: Vec<String>,
}

#[derive(Serialize)]
struct BatchGeocodeResponse {
    success: bool,
    results: Vec<BatchEntry>,
}

/// Per-input batch outcome for API responses
#[derive(Serialize)]
struct BatchEntry {
    query: String,
    path: String,
    status: String,
    data: Option<LocationRecord>,
    error: Option<String>,
}

impl BatchEntry {
    fn from_resolved(entry: &ResolvedLocation) -> Self {
        let (status, data, error) = match &entry.outcome {
            LookupOutcome::Found(record) => ("found", Some(record.clone()), None),
            LookupOutcome::NotFound => ("not_found", None, None),
            LookupOutcome::Failed(e) => ("error", None, Some(e.to_string())),
        };

        Self {
            query: entry.query.clone(),
            path: entry.path.to_string(),
            status: status.to_string(),
            data,
            error,
        }
    }
}

/// Get server metrics
async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_requests: state.metrics.total_requests.load(Ordering::Relaxed),
        requests_in_flight: state.metrics.requests_in_flight.load(Ordering::Relaxed),
        uptime_seconds: state.metrics.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    uptime_seconds: u64,
}

/// API error types
enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Provider or transport failure behind this service
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
