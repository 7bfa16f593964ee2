//! Prediction and Explanation Routes

use axum::{extract::State, Json};
use feature_engine::RawRecord;
use inference_engine::Explanation;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{ApiError, AppState};
use storage::PredictionRecord;

/// Response for the predict endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_fuel_consumption: f64,
    pub warnings: Vec<String>,
}

/// Predict fuel consumption for one voyage
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RawRecord>,
) -> Result<Json<PredictResponse>, ApiError> {
    let engine = state.engine()?;

    let result = engine.predict(&request).map_err(|e| {
        metrics::counter!("optifuel_prediction_errors_total").increment(1);
        ApiError::from(e)
    })?;
    metrics::counter!("optifuel_predictions_total").increment(1);

    if result.suspicious {
        metrics::counter!("optifuel_zero_fill_warnings_total").increment(1);
        warn!("Suspicious request: {}", result.warnings.join("; "));
    }

    let id = state.repository.insert_prediction(PredictionRecord {
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
        distance: request.distance,
        engine_efficiency: request.engine_efficiency,
        month: result.month,
        ship_type: request.ship_type,
        route_id: request.route_id,
        fuel_type: request.fuel_type,
        weather_conditions: request.weather_conditions,
        predicted_fuel_consumption: result.prediction,
        ..Default::default()
    })?;
    debug!("Prediction {} served in {}us", id, result.latency_us);

    Ok(Json(PredictResponse {
        predicted_fuel_consumption: result.prediction,
        warnings: result.warnings,
    }))
}

/// Per-feature attribution of one voyage's prediction
pub async fn explain(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RawRecord>,
) -> Result<Json<Explanation>, ApiError> {
    let engine = state.engine()?;

    let explanation = engine.explain(&request).map_err(|e| {
        metrics::counter!("optifuel_explanation_errors_total").increment(1);
        ApiError::from(e)
    })?;
    metrics::counter!("optifuel_explanations_total").increment(1);

    Ok(Json(explanation))
}
