//! Inference Engine Implementation

use std::collections::BTreeMap;
use std::time::Instant;

use feature_engine::{
    month_number, CanonicalOrder, FittedScaler, RawRecord, TransformationPipeline, TransformedRecord,
};
use serde::{Deserialize, Serialize};
use storage::{ArtifactKind, ArtifactStore};
use tracing::{debug, info, warn};

use crate::model::{LinearModel, RegressionModel};
use crate::InferenceError;

/// The three artifacts a trained model is served with
pub struct ServingArtifacts {
    model: Box<dyn RegressionModel>,
    scaler: FittedScaler,
    canonical_order: CanonicalOrder,
}

impl ServingArtifacts {
    pub fn new(
        model: Box<dyn RegressionModel>,
        scaler: FittedScaler,
        canonical_order: CanonicalOrder,
    ) -> Self {
        let lengths = [model.n_features(), scaler.n_features(), canonical_order.len()];
        if lengths.iter().any(|&n| n != canonical_order.len()) {
            warn!(
                "Artifact skew: model={} scaler={} feature_order={} features; requests will fail",
                lengths[0], lengths[1], lengths[2]
            );
        }

        Self {
            model,
            scaler,
            canonical_order,
        }
    }

    /// Load model, scaler and feature order from the store
    ///
    /// Any missing blob leaves the engine not ready.
    pub fn load(store: &ArtifactStore) -> Result<Self, InferenceError> {
        let missing = store.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|k| k.file_name()).collect();
            return Err(InferenceError::NotReady(format!(
                "missing artifacts in {}: {}",
                store.dir().display(),
                names.join(", ")
            )));
        }

        let canonical_order: CanonicalOrder = store.load(ArtifactKind::FeatureOrder)?;
        let scaler: FittedScaler = store.load(ArtifactKind::Scaler)?;
        let model: LinearModel = store.load(ArtifactKind::Model)?;

        info!(
            "Loaded serving artifacts from {} ({} features)",
            store.dir().display(),
            canonical_order.len()
        );

        Ok(Self::new(Box::new(model), scaler, canonical_order))
    }

    pub fn canonical_order(&self) -> &CanonicalOrder {
        &self.canonical_order
    }

    pub fn scaler(&self) -> &FittedScaler {
        &self.scaler
    }

    pub fn model(&self) -> &dyn RegressionModel {
        self.model.as_ref()
    }
}

/// Result of a prediction
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    /// Predicted fuel consumption, rounded to two decimals
    pub prediction: f64,
    /// Month of the voyage, resolved to 1-12
    pub month: u32,
    /// Transformation and scoring latency in microseconds
    pub latency_us: u64,
    /// Zero-filled share of the feature order exceeded the configured limit
    pub suspicious: bool,
    /// Reconciliation warnings worth surfacing to the caller
    pub warnings: Vec<String>,
}

/// Signed contribution of every canonical feature to a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub base_value: f64,
    pub contributions: BTreeMap<String, f64>,
}

/// Serves predictions from immutable artifacts
///
/// Holds no mutable state, so one instance behind an `Arc` serves any
/// number of concurrent requests.
pub struct InferenceEngine {
    artifacts: ServingArtifacts,
    pipeline: TransformationPipeline,
}

impl InferenceEngine {
    pub fn new(artifacts: ServingArtifacts, pipeline: TransformationPipeline) -> Self {
        Self {
            artifacts,
            pipeline,
        }
    }

    pub fn artifacts(&self) -> &ServingArtifacts {
        &self.artifacts
    }

    pub fn n_features(&self) -> usize {
        self.artifacts.canonical_order.len()
    }

    fn transform(&self, record: &RawRecord) -> Result<TransformedRecord, InferenceError> {
        Ok(self.pipeline.transform(
            record,
            &self.artifacts.canonical_order,
            &self.artifacts.scaler,
        )?)
    }

    /// Predict fuel consumption for one voyage
    pub fn predict(&self, record: &RawRecord) -> Result<InferenceResult, InferenceError> {
        let start = Instant::now();

        let transformed = self.transform(record)?;
        let month = month_number(&record.month)?;
        let raw = self.artifacts.model.predict(&transformed.vector)?;
        let prediction = (raw * 100.0).round() / 100.0;

        let latency_us = start.elapsed().as_micros() as u64;
        debug!("Predicted {} in {}us", prediction, latency_us);

        Ok(InferenceResult {
            prediction,
            month,
            latency_us,
            suspicious: transformed.suspicious,
            warnings: warnings(&transformed, self.n_features()),
        })
    }

    /// Attribute one voyage's prediction to its canonical features
    pub fn explain(&self, record: &RawRecord) -> Result<Explanation, InferenceError> {
        let transformed = self.transform(record)?;
        let values = self.artifacts.model.contributions(&transformed.vector)?;

        let contributions = self
            .artifacts
            .canonical_order
            .columns()
            .iter()
            .cloned()
            .zip(values)
            .collect();

        Ok(Explanation {
            base_value: self.artifacts.model.base_value(),
            contributions,
        })
    }
}

fn warnings(transformed: &TransformedRecord, n_features: usize) -> Vec<String> {
    let mut out = Vec::new();
    if transformed.suspicious {
        out.push(format!(
            "{} of {} model features were zero-filled; the loaded feature order may not match this request",
            transformed.zero_filled.len(),
            n_features
        ));
    }
    if !transformed.dropped.is_empty() {
        out.push(format!(
            "ignored features unknown to the model: {}",
            transformed.dropped.join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::{FeatureError, MonthValue};
    use ndarray::Array2;
    use tempfile::tempdir;

    fn voyage(ship_type: &str, weather: &str, month: i64, distance: f64) -> RawRecord {
        RawRecord {
            distance,
            engine_efficiency: 80.0,
            ship_type: ship_type.to_string(),
            route_id: "Lagos-Apapa".to_string(),
            fuel_type: "Diesel".to_string(),
            weather_conditions: weather.to_string(),
            month: MonthValue::Number(month),
        }
    }

    fn training_set() -> (Vec<RawRecord>, Vec<f64>) {
        let ships = ["Oil Service Boat", "Fishing Trawler", "Surfer Boat", "Tanker Ship"];
        let weathers = ["Calm", "Moderate", "Stormy"];
        let mut records = Vec::new();
        let mut targets = Vec::new();
        for (i, ship) in ships.iter().enumerate() {
            for (j, weather) in weathers.iter().enumerate() {
                for month in [1, 4, 7, 10] {
                    let distance = 100.0 + 25.0 * month as f64 + 10.0 * i as f64;
                    records.push(voyage(ship, weather, month, distance));
                    targets.push(12.0 * distance + 300.0 * j as f64 + 50.0 * i as f64);
                }
            }
        }
        (records, targets)
    }

    fn trained_engine() -> InferenceEngine {
        let pipeline = TransformationPipeline::default();
        let (records, targets) = training_set();
        let output = pipeline.fit_transform(&records).unwrap();
        let model = LinearModel::fit(&output.features, &targets, 1e-6).unwrap();
        let artifacts = ServingArtifacts::new(Box::new(model), output.scaler, output.canonical_order);
        InferenceEngine::new(artifacts, pipeline)
    }

    #[test]
    fn test_predict_tracks_training_targets() {
        let engine = trained_engine();
        let result = engine.predict(&voyage("Tanker Ship", "Stormy", 7, 305.0)).unwrap();

        let expected = 12.0 * 305.0 + 600.0 + 150.0;
        assert!((result.prediction - expected).abs() < 1.0, "got {}", result.prediction);
        assert_eq!(result.month, 7);
        assert!(result.warnings.is_empty());
        assert!(!result.suspicious);
    }

    #[test]
    fn test_prediction_rounded_to_cents() {
        let engine = trained_engine();
        let result = engine.predict(&voyage("Surfer Boat", "Calm", 3, 123.456)).unwrap();
        assert_eq!(result.prediction, (result.prediction * 100.0).round() / 100.0);
    }

    #[test]
    fn test_explanation_keys_follow_canonical_order() {
        let engine = trained_engine();
        let record = voyage("Fishing Trawler", "Moderate", 10, 360.0);
        let explanation = engine.explain(&record).unwrap();

        assert_eq!(explanation.contributions.len(), engine.n_features());
        for name in engine.artifacts().canonical_order().columns() {
            assert!(explanation.contributions.contains_key(name));
        }

        let raw: f64 = explanation.base_value + explanation.contributions.values().sum::<f64>();
        let predicted = engine.predict(&record).unwrap().prediction;
        assert!((raw - predicted).abs() < 0.01);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let engine = trained_engine();
        let err = engine.predict(&voyage("Yacht", "Calm", 1, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Feature(FeatureError::UnknownCategory { field: "ship_type", .. })
        ));
    }

    #[test]
    fn test_artifact_skew_fails_per_request() {
        let pipeline = TransformationPipeline::default();
        let (records, targets) = training_set();
        let output = pipeline.fit_transform(&records).unwrap();
        let model = LinearModel::fit(&output.features, &targets, 1e-6).unwrap();

        let short: Vec<String> = output.canonical_order.columns()[..output.canonical_order.len() - 1].to_vec();
        let canonical = CanonicalOrder::new(short).unwrap();
        let engine = InferenceEngine::new(
            ServingArtifacts::new(Box::new(model), output.scaler, canonical),
            pipeline,
        );

        let err = engine.predict(&voyage("Tanker Ship", "Calm", 1, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Feature(FeatureError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_month_name_resolved() {
        let engine = trained_engine();
        let mut record = voyage("Tanker Ship", "Calm", 1, 200.0);
        record.month = MonthValue::from("September");
        assert_eq!(engine.predict(&record).unwrap().month, 9);
    }

    #[test]
    fn test_model_width_skew_is_shape_error() {
        let pipeline = TransformationPipeline::default();
        let (records, _) = training_set();
        let output = pipeline.fit_transform(&records).unwrap();
        let n = output.canonical_order.len();
        let model = LinearModel::new(1.0, vec![0.5; n - 1], vec![0.0; n - 1]).unwrap();
        let engine = InferenceEngine::new(
            ServingArtifacts::new(Box::new(model), output.scaler, output.canonical_order),
            pipeline,
        );

        let err = engine.predict(&voyage("Tanker Ship", "Calm", 1, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::InvalidInputShape { expected, actual } if expected == n - 1 && actual == n
        ));
    }

    /// Engine scoring a constant 100 over the given feature order
    fn engine_with_order(columns: Vec<String>) -> InferenceEngine {
        let n = columns.len();
        let scaler = FittedScaler::fit(&Array2::ones((2, n))).unwrap();
        let model = LinearModel::new(100.0, vec![0.0; n], vec![0.0; n]).unwrap();
        InferenceEngine::new(
            ServingArtifacts::new(Box::new(model), scaler, CanonicalOrder::new(columns).unwrap()),
            TransformationPipeline::default(),
        )
    }

    fn request_columns(record: &RawRecord) -> Vec<String> {
        TransformationPipeline::default()
            .encode(record)
            .unwrap()
            .names()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_mostly_unknown_feature_order_is_flagged() {
        let record = voyage("Tanker Ship", "Stormy", 5, 250.0);
        let mut columns = request_columns(&record);
        columns.extend((0..30).map(|k| format!("route_id_Ghost{k}")));
        let engine = engine_with_order(columns);

        let result = engine.predict(&record).unwrap();
        assert_eq!(result.prediction, 100.0);
        assert!(result.suspicious);
        assert_eq!(result.warnings.len(), 1);
        assert!(
            result.warnings[0].starts_with("30 of 45 model features were zero-filled"),
            "got {:?}",
            result.warnings
        );
    }

    #[test]
    fn test_unknown_request_column_is_reported() {
        let record = voyage("Tanker Ship", "Stormy", 5, 250.0);
        let columns: Vec<String> = request_columns(&record)
            .into_iter()
            .filter(|c| c != "fuel_type_HFO")
            .collect();
        let engine = engine_with_order(columns);

        let result = engine.predict(&record).unwrap();
        assert!(!result.suspicious);
        assert_eq!(
            result.warnings,
            vec!["ignored features unknown to the model: fuel_type_HFO".to_string()]
        );
    }

    #[test]
    fn test_load_from_store() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        assert!(matches!(
            ServingArtifacts::load(&store),
            Err(InferenceError::NotReady(_))
        ));

        let pipeline = TransformationPipeline::default();
        let (records, targets) = training_set();
        let output = pipeline.fit_transform(&records).unwrap();
        let model = LinearModel::fit(&output.features, &targets, 1e-6).unwrap();
        store.save(ArtifactKind::Model, &model).unwrap();
        store.save(ArtifactKind::Scaler, &output.scaler).unwrap();
        store.save(ArtifactKind::FeatureOrder, &output.canonical_order).unwrap();

        let artifacts = ServingArtifacts::load(&store).unwrap();
        assert_eq!(artifacts.canonical_order(), &output.canonical_order);
        assert_eq!(artifacts.scaler(), &output.scaler);
        assert_eq!(artifacts.model().n_features(), output.canonical_order.len());
    }

    #[test]
    fn test_empty_feature_order_is_not_loadable() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(ArtifactKind::FeatureOrder, &Vec::<String>::new()).unwrap();
        store
            .save(ArtifactKind::Model, &LinearModel::new(0.0, vec![], vec![]).unwrap())
            .unwrap();
        std::fs::write(store.path(ArtifactKind::Scaler), r#"{"mean":[0.0],"scale":[1.0]}"#).unwrap();

        assert!(matches!(
            ServingArtifacts::load(&store),
            Err(InferenceError::Storage(_))
        ));
    }
}
