//! Prediction History Repository

use crate::analytics::{DeviationCategory, DeviationSummary};
use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

/// One served prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub timestamp_ms: i64,
    pub distance: f64,
    pub engine_efficiency: f64,
    pub ship_type: String,
    pub route_id: String,
    pub fuel_type: String,
    pub weather_conditions: String,
    pub month: u32,
    pub predicted_fuel_consumption: f64,
    /// Measured consumption, reported once the voyage is complete
    pub actual_fuel_consumption: Option<f64>,
}

impl PredictionRecord {
    /// Signed deviation of the actual from the predicted consumption, in percent
    ///
    /// `None` until an actual value is recorded, or when the prediction is zero.
    pub fn deviation_percent(&self) -> Option<f64> {
        let actual = self.actual_fuel_consumption?;
        if self.predicted_fuel_consumption == 0.0 {
            return None;
        }
        Some((actual - self.predicted_fuel_consumption) / self.predicted_fuel_consumption * 100.0)
    }

    pub fn deviation_category(&self) -> Option<DeviationCategory> {
        self.deviation_percent().map(DeviationCategory::classify)
    }
}

/// History query filters; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryFilter {
    pub ship_type: Option<String>,
    pub weather_conditions: Option<String>,
    /// Only completed voyages in this deviation band
    pub deviation: Option<DeviationCategory>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &PredictionRecord) -> bool {
        self.ship_type.as_deref().map_or(true, |s| record.ship_type == s)
            && self
                .weather_conditions
                .as_deref()
                .map_or(true, |w| record.weather_conditions == w)
            && self
                .deviation
                .map_or(true, |d| record.deviation_category() == Some(d))
    }
}

struct HistoryState {
    records: VecDeque<PredictionRecord>,
    next_id: i64,
}

/// Bounded in-memory prediction history
pub struct Repository {
    state: Mutex<HistoryState>,
    /// Oldest records are evicted past this count
    max_records: usize,
}

impl Repository {
    /// Create a repository with the default retention limit
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(max_records: usize) -> Self {
        let max_records = max_records.max(1);
        info!("Creating in-memory prediction history (max {} records)", max_records);
        Self {
            state: Mutex::new(HistoryState {
                records: VecDeque::with_capacity(max_records.min(1024)),
                next_id: 1,
            }),
            max_records,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HistoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Insert a prediction, assigning its ID
    pub fn insert_prediction(&self, mut record: PredictionRecord) -> Result<i64, StorageError> {
        let mut state = self.lock()?;

        record.id = state.next_id;
        state.next_id += 1;

        while state.records.len() >= self.max_records {
            state.records.pop_front();
        }

        let id = record.id;
        state.records.push_back(record);
        debug!("Inserted prediction with ID {}", id);

        Ok(id)
    }

    /// Attach the measured consumption to a stored prediction
    pub fn record_actual(&self, id: i64, actual: f64) -> Result<PredictionRecord, StorageError> {
        if !(actual.is_finite() && actual >= 0.0) {
            return Err(StorageError::InvalidValue(format!(
                "actual fuel consumption must be finite and non-negative, got {actual}"
            )));
        }

        let mut state = self.lock()?;
        let record = state
            .records
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StorageError::RecordNotFound(id))?;

        record.actual_fuel_consumption = Some(actual);
        debug!("Recorded actual consumption {} for prediction {}", actual, id);
        Ok(record.clone())
    }

    /// Most recent predictions first, restricted by `filter`
    pub fn get_predictions(
        &self,
        filter: &HistoryFilter,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError> {
        let state = self.lock()?;

        Ok(state
            .records
            .iter()
            .rev()
            .filter(|p| filter.matches(p))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Predicted versus actual consumption over the retained history
    pub fn deviation_summary(&self) -> Result<DeviationSummary, StorageError> {
        let state = self.lock()?;
        Ok(DeviationSummary::from_records(state.records.iter()))
    }

    pub fn prediction_count(&self) -> usize {
        self.state.lock().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.records.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
