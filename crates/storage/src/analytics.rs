//! Deviation Analytics
//!
//! Compares served predictions with the consumption reported after the
//! voyage. Deviation is `(actual - predicted) / predicted * 100`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::PredictionRecord;

/// Deviation band of a completed voyage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviationCategory {
    /// At least 3% below the prediction
    Saving,
    /// Within ±3%
    Normal,
    /// 3% to 7% above
    Warning,
    /// More than 7% above
    Critical,
}

impl DeviationCategory {
    pub const ALL: [DeviationCategory; 4] = [
        DeviationCategory::Saving,
        DeviationCategory::Normal,
        DeviationCategory::Warning,
        DeviationCategory::Critical,
    ];

    pub fn classify(deviation_percent: f64) -> Self {
        if deviation_percent <= -3.0 {
            DeviationCategory::Saving
        } else if deviation_percent <= 3.0 {
            DeviationCategory::Normal
        } else if deviation_percent <= 7.0 {
            DeviationCategory::Warning
        } else {
            DeviationCategory::Critical
        }
    }
}

/// Average deviation of one ship type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipDeviation {
    pub ship_type: String,
    pub completed: usize,
    pub average_deviation_percent: f64,
}

/// Average measured consumption under one weather condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConsumption {
    pub weather_conditions: String,
    pub completed: usize,
    pub average_actual_consumption: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviationHistogram {
    pub saving: usize,
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
}

impl DeviationHistogram {
    fn add(&mut self, category: DeviationCategory) {
        match category {
            DeviationCategory::Saving => self.saving += 1,
            DeviationCategory::Normal => self.normal += 1,
            DeviationCategory::Warning => self.warning += 1,
            DeviationCategory::Critical => self.critical += 1,
        }
    }
}

/// Predicted versus actual consumption across the history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviationSummary {
    pub total_predictions: usize,
    /// Predictions with a recorded actual value
    pub completed: usize,
    pub total_predicted: f64,
    /// Sum of recorded actual values
    pub total_actual: f64,
    /// Mean deviation over completed voyages; 0 when there are none
    pub average_deviation_percent: f64,
    /// Worst average deviation first
    pub by_ship_type: Vec<ShipDeviation>,
    /// Lowest average consumption first
    pub by_weather: Vec<WeatherConsumption>,
    pub histogram: DeviationHistogram,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

impl DeviationSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PredictionRecord>) -> Self {
        let mut summary = DeviationSummary::default();
        let mut overall = Mean::default();
        let mut ships: BTreeMap<&str, Mean> = BTreeMap::new();
        let mut weather: BTreeMap<&str, Mean> = BTreeMap::new();

        for record in records {
            summary.total_predictions += 1;
            summary.total_predicted += record.predicted_fuel_consumption;

            let Some(actual) = record.actual_fuel_consumption else {
                continue;
            };
            summary.completed += 1;
            summary.total_actual += actual;
            weather
                .entry(record.weather_conditions.as_str())
                .or_default()
                .add(actual);

            if let Some(deviation) = record.deviation_percent() {
                overall.add(deviation);
                ships.entry(record.ship_type.as_str()).or_default().add(deviation);
                summary.histogram.add(DeviationCategory::classify(deviation));
            }
        }

        summary.average_deviation_percent = overall.value();

        summary.by_ship_type = ships
            .into_iter()
            .map(|(ship_type, mean)| ShipDeviation {
                ship_type: ship_type.to_string(),
                completed: mean.count,
                average_deviation_percent: mean.value(),
            })
            .collect();
        summary
            .by_ship_type
            .sort_by(|a, b| b.average_deviation_percent.total_cmp(&a.average_deviation_percent));

        summary.by_weather = weather
            .into_iter()
            .map(|(weather_conditions, mean)| WeatherConsumption {
                weather_conditions: weather_conditions.to_string(),
                completed: mean.count,
                average_actual_consumption: mean.value(),
            })
            .collect();
        summary
            .by_weather
            .sort_by(|a, b| a.average_actual_consumption.total_cmp(&b.average_actual_consumption));

        summary
    }
}
