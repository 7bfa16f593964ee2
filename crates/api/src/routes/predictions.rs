//! Prediction History Routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::{ApiError, AppState};
use storage::{DeviationCategory, DeviationSummary, HistoryFilter, PredictionRecord};

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct PredictionQuery {
    /// Filter by ship type
    pub ship_type: Option<String>,
    /// Filter by weather conditions
    pub weather_conditions: Option<String>,
    /// Only completed voyages in this deviation band
    pub deviation: Option<DeviationCategory>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for the history endpoint
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub data: Vec<PredictionRecord>,
    pub count: usize,
}

/// Recent predictions, newest first
pub async fn get_predictions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PredictionQuery>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let limit = params.limit.min(500);
    let filter = HistoryFilter {
        ship_type: params.ship_type,
        weather_conditions: params.weather_conditions,
        deviation: params.deviation,
    };

    let data = state.repository.get_predictions(&filter, limit)?;

    Ok(Json(PredictionResponse {
        count: data.len(),
        data,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ActualConsumption {
    pub actual_fuel_consumption: f64,
}

/// Record the measured consumption of a completed voyage
pub async fn record_actual(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ActualConsumption>,
) -> Result<Json<PredictionRecord>, ApiError> {
    let record = state
        .repository
        .record_actual(id, body.actual_fuel_consumption)?;

    if let Some(deviation) = record.deviation_percent() {
        info!("Voyage {} completed with {:.2}% deviation", id, deviation);
    }
    metrics::counter!("optifuel_actuals_recorded_total").increment(1);

    Ok(Json(record))
}

/// Predicted versus actual consumption across the retained history
pub async fn analytics_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeviationSummary>, ApiError> {
    Ok(Json(state.repository.deviation_summary()?))
}
