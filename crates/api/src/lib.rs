//! OptiFuel Prediction API Server
//!
//! Thin HTTP layer over the inference engine. Artifacts are loaded once at
//! startup; a service without them stays up and answers "not ready".

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use feature_engine::TransformationPipeline;
use inference_engine::{InferenceEngine, ServingArtifacts};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use storage::{ArtifactStore, Repository};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
pub mod routes;

pub use config::ServiceConfig;
pub use error::ApiError;

/// Serving artifacts as decided at startup
pub enum ArtifactState {
    NotLoaded { reason: String },
    Ready(Arc<InferenceEngine>),
}

impl ArtifactState {
    /// Load the artifacts from the store; failure is recorded, not fatal
    pub fn load(store: &ArtifactStore, pipeline: TransformationPipeline) -> Self {
        match ServingArtifacts::load(store) {
            Ok(artifacts) => {
                ArtifactState::Ready(Arc::new(InferenceEngine::new(artifacts, pipeline)))
            }
            Err(e) => {
                warn!("Serving without a model: {}", e);
                ArtifactState::NotLoaded {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ArtifactState::Ready(_))
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub artifacts: ArtifactState,
    /// Served prediction history
    pub repository: Repository,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(artifacts: ArtifactState, repository: Repository) -> Self {
        Self {
            artifacts,
            repository,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        let store = ArtifactStore::new(&config.artifacts_dir);
        let pipeline = TransformationPipeline::new(config.pipeline());
        Self::new(
            ArtifactState::load(&store, pipeline),
            Repository::with_capacity(config.history_limit),
        )
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// The loaded engine, or a not-ready error
    pub fn engine(&self) -> Result<&Arc<InferenceEngine>, ApiError> {
        match &self.artifacts {
            ArtifactState::Ready(engine) => Ok(engine),
            ArtifactState::NotLoaded { reason } => Err(ApiError::NotReady(reason.clone())),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub version: String,
    pub uptime_seconds: u64,
    pub n_features: Option<usize>,
    pub prediction_count: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/predict", post(routes::predict::predict))
        .route("/explain", post(routes::predict::explain))
        .route("/api/v1/predictions", get(routes::predictions::get_predictions))
        .route(
            "/api/v1/predictions/:id/actual",
            put(routes::predictions::record_actual),
        )
        .route(
            "/api/v1/analytics/summary",
            get(routes::predictions::analytics_summary),
        )
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the OptiFuel API!",
        "version": state.version,
    }))
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, reason, n_features) = match &state.artifacts {
        ArtifactState::Ready(engine) => ("ready", None, Some(engine.n_features())),
        ArtifactState::NotLoaded { reason } => ("not_ready", Some(reason.clone()), None),
    };

    Json(HealthResponse {
        status,
        reason,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        n_features,
        prediction_count: state.repository.prediction_count(),
    })
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Initialize logging
pub fn init_logging(json: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Run the server
pub async fn run_server(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let state = Arc::new(AppState::from_config(&config).with_metrics(handle));

    if state.artifacts.is_ready() {
        info!("Model artifacts loaded from {}", config.artifacts_dir.display());
    }

    let app = create_router(state);

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
