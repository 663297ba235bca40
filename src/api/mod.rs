mod error;
mod payload;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::{ConfigError, CorsOrigins, ServerConfig};
use crate::core::{
    CancellationFlag, Histogram, MonteCarloResult, ProjectionInput, compare, histogram, project,
    simulate, summarize,
};

pub use error::{ApiError, ServerError};
pub use payload::{
    ComparePayload, HistogramRequest, MonteCarloPayload, MonteCarloRequest, validate_input,
};

#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
}

#[derive(Debug, Serialize)]
pub struct MonteCarloResponse {
    #[serde(flatten)]
    pub result: MonteCarloResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Cancels the simulation when the request future is dropped, e.g. on
/// client disconnect.
struct CancelOnDrop(Option<CancellationFlag>);

impl CancelOnDrop {
    fn new(cancel: CancellationFlag) -> Self {
        Self(Some(cancel))
    }

    /// The run finished; leave the flag untouched.
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(cancel) = self.0.take() {
            cancel.cancel();
        }
    }
}

pub fn router(config: ServerConfig) -> Result<Router, ConfigError> {
    let cors = cors_layer(&config)?;
    let state = AppState {
        config: Arc::new(config),
    };

    Ok(Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/calculate", post(calculate_handler))
        .route("/api/projection-summary", post(projection_summary_handler))
        .route("/api/montecarlo", post(monte_carlo_handler))
        .route("/api/compare", post(compare_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(cors))
}

pub async fn run_http_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    let addr = config.socket_addr();
    let app = router(config)?;

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "nestegg HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("nestegg HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH]);

    Ok(match config.cors_origins()? {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(origins) => layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true),
    })
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_handler(
    payload: Result<Json<ProjectionInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = accept_input(payload)?;
    let rows = project(&input);
    info!(
        current_age = input.current_age,
        retirement_age = input.retirement_age,
        rows = rows.len(),
        "projection calculated"
    );
    Ok(json_response(StatusCode::OK, rows))
}

async fn projection_summary_handler(
    payload: Result<Json<ProjectionInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = accept_input(payload)?;
    let summary = summarize(&project(&input));
    Ok(json_response(StatusCode::OK, summary))
}

async fn monte_carlo_handler(
    State(state): State<AppState>,
    payload: Result<Json<MonteCarloPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = accept(payload)?;
    let request = payload
        .into_request(&state.config)
        .map_err(ApiError::BadRequest)?;

    let started = Instant::now();
    let cancel = CancellationFlag::new();
    let guard = CancelOnDrop::new(cancel.clone());
    let task = {
        let input = request.input.clone();
        let config = request.config;
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || simulate(&input, &config, &cancel))
    };

    let timeout = state.config.simulation_timeout();
    let result = match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined.map_err(|e| ApiError::TaskFailed(e.to_string()))??,
        Err(_) => {
            cancel.cancel();
            warn!(
                iterations = request.config.iterations,
                timeout_secs = timeout.as_secs(),
                "monte carlo simulation timed out"
            );
            return Err(ApiError::Timeout(timeout));
        }
    };
    guard.disarm();

    info!(
        iterations = result.iterations,
        seed = result.seed,
        years = result.results.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "monte carlo calculated"
    );
    Ok(json_response(
        StatusCode::OK,
        build_monte_carlo_response(result, request.histogram),
    ))
}

pub fn build_monte_carlo_response(
    result: MonteCarloResult,
    wanted: Option<HistogramRequest>,
) -> MonteCarloResponse {
    let histogram = wanted.map(|wanted| {
        let values = result
            .results
            .iter()
            .find(|summary| summary.year == wanted.year)
            .map(|summary| summary.all_results.as_slice())
            .unwrap_or(&[]);
        histogram(values, wanted.bins)
    });
    MonteCarloResponse { result, histogram }
}

async fn compare_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComparePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = accept(payload)?;
    payload
        .validate(&state.config)
        .map_err(ApiError::BadRequest)?;
    let comparisons = compare(&payload.scenarios);
    Ok(json_response(StatusCode::OK, comparisons))
}

fn accept<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "rejected request body");
            Err(ApiError::BadRequest(format!(
                "Invalid input: {}",
                rejection.body_text()
            )))
        }
    }
}

fn accept_input(
    payload: Result<Json<ProjectionInput>, JsonRejection>,
) -> Result<ProjectionInput, ApiError> {
    let input = accept(payload)?;
    validate_input(&input).map_err(ApiError::BadRequest)?;
    Ok(input)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
