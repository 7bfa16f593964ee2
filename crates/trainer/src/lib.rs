//! Fuel Consumption Model Trainer
//!
//! One-shot batch job: load the voyage log, fit the feature pipeline and a
//! linear model on a seeded training split, evaluate on the held-out split
//! through the serving path, and publish the artifacts the API loads.

use anyhow::{Context, Result};
use feature_engine::{PipelineConfig, TransformationPipeline};
use inference_engine::{LinearModel, RegressionMetrics};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use storage::{ArtifactKind, ArtifactStore};
use tracing::info;

pub mod data;

pub use data::{load_dataset, Dataset};

/// Training job parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Voyage log CSV
    pub data_path: PathBuf,
    /// Directory receiving the artifacts
    pub artifacts_dir: PathBuf,
    /// Held-out share of the rows
    pub test_size: f64,
    pub seed: u64,
    /// Ridge penalty on the standardized coefficients
    pub ridge: f64,
    pub pipeline: PipelineConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/nigerian_fuel_consumption.csv"),
            artifacts_dir: PathBuf::from("artifacts"),
            test_size: 0.2,
            seed: 42,
            ridge: 1.0,
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Summary of a training run, persisted next to the artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_test: usize,
    pub feature_order: Vec<String>,
    pub ridge: f64,
    pub seed: u64,
    pub train_metrics: RegressionMetrics,
    pub test_metrics: RegressionMetrics,
}

/// Run the full training job and write every artifact
pub fn run_training(config: &TrainingConfig) -> Result<TrainingReport> {
    let dataset = load_dataset(&config.data_path)?;
    let (train, test) = dataset
        .split(config.test_size, config.seed)
        .context("Failed to split training data")?;
    info!("Split {} voyages into {} train / {} test", dataset.len(), train.len(), test.len());

    let pipeline = TransformationPipeline::new(config.pipeline.clone());
    let output = pipeline
        .fit_transform(&train.records)
        .context("Failed to fit feature pipeline")?;

    let model = LinearModel::fit(&output.features, &train.targets, config.ridge)
        .context("Failed to fit linear model")?;

    let train_pred = model.predict_batch(&output.features)?;
    let train_metrics = RegressionMetrics::evaluate(&train.targets, &train_pred)?;

    // Held-out rows go through the serving path, not the training matrix
    let test_features = pipeline
        .transform_batch(&test.records, &output.canonical_order, &output.scaler)
        .context("Failed to transform held-out data")?;
    let test_pred = model.predict_batch(&test_features)?;
    let test_metrics = RegressionMetrics::evaluate(&test.targets, &test_pred)?;

    info!(
        "Held-out metrics: MAE={:.3} RMSE={:.3} R2={:.4}",
        test_metrics.mae, test_metrics.rmse, test_metrics.r_squared
    );

    let report = TrainingReport {
        n_train: train.len(),
        n_test: test.len(),
        feature_order: output.canonical_order.columns().to_vec(),
        ridge: config.ridge,
        seed: config.seed,
        train_metrics,
        test_metrics,
    };

    let store = ArtifactStore::new(&config.artifacts_dir);
    store.save(ArtifactKind::Model, &model)?;
    store.save(ArtifactKind::Scaler, &output.scaler)?;
    store.save(ArtifactKind::FeatureOrder, &output.canonical_order)?;
    store.save(ArtifactKind::TrainingReport, &report)?;

    info!("Artifacts written to {}", store.dir().display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::{MonthValue, RawRecord};
    use inference_engine::{InferenceEngine, ServingArtifacts};
    use std::fmt::Write as _;
    use tempfile::tempdir;

    const SHIPS: [&str; 4] = ["Oil Service Boat", "Fishing Trawler", "Surfer Boat", "Tanker Ship"];
    const ROUTES: [&str; 4] = ["Warri-Bonny", "Port Harcourt-Lagos", "Lagos-Apapa", "Escravos-Lagos"];
    const WEATHER: [&str; 3] = ["Calm", "Moderate", "Stormy"];
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];

    fn consumption(distance: f64, ship: usize, weather: usize, diesel: bool) -> f64 {
        20.0 * distance + 400.0 * ship as f64 + 150.0 * weather as f64 + if diesel { -75.0 } else { 0.0 }
    }

    fn voyage_log(rows: usize) -> String {
        let mut csv = String::from(
            "ship_id,ship_type,route_id,month,distance,fuel_type,fuel_consumption,CO2_emissions,weather_conditions,engine_efficiency\n",
        );
        for i in 0..rows {
            let ship = i % 4;
            let route = (i / 4) % 4;
            let weather = (i / 3) % 3;
            // Independent of ship type
            let diesel = (i / 16) % 2 == 0;
            let distance = 50.0 + (i * 37 % 200) as f64;
            let target = consumption(distance, ship, weather, diesel);
            writeln!(
                csv,
                "NG{:03},{},{},{},{:.1},{},{:.2},{:.2},{},{:.1}",
                i,
                SHIPS[ship],
                ROUTES[route],
                MONTHS[i % 12],
                distance,
                if diesel { "Diesel" } else { "HFO" },
                target,
                target * 2.7,
                WEATHER[weather],
                70.0 + (i % 25) as f64
            )
            .unwrap();
        }
        csv
    }

    #[test]
    fn test_training_writes_loadable_artifacts() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("voyages.csv");
        std::fs::write(&data_path, voyage_log(120)).unwrap();

        let config = TrainingConfig {
            data_path,
            artifacts_dir: dir.path().join("artifacts"),
            ridge: 1e-3,
            ..Default::default()
        };
        let report = run_training(&config).unwrap();

        assert_eq!(report.n_train + report.n_test, 120);
        assert_eq!(report.n_test, 24);
        assert_eq!(report.feature_order.len(), 15);
        assert!(report.test_metrics.r_squared > 0.99, "{:?}", report.test_metrics);

        let store = ArtifactStore::new(&config.artifacts_dir);
        assert!(store.missing().is_empty());
        assert!(store.exists(ArtifactKind::TrainingReport));

        let engine = InferenceEngine::new(
            ServingArtifacts::load(&store).unwrap(),
            TransformationPipeline::default(),
        );
        let result = engine
            .predict(&RawRecord {
                distance: 120.0,
                engine_efficiency: 85.0,
                ship_type: "Tanker Ship".to_string(),
                route_id: "Lagos-Apapa".to_string(),
                fuel_type: "Diesel".to_string(),
                weather_conditions: "Stormy".to_string(),
                month: MonthValue::Name("November".to_string()),
            })
            .unwrap();

        let expected = consumption(120.0, 3, 2, true);
        assert!((result.prediction - expected).abs() < 5.0, "got {}", result.prediction);
    }

    #[test]
    fn test_unknown_category_in_data_fails() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("voyages.csv");
        let mut csv = voyage_log(20);
        csv.push_str("NG999,Yacht,Lagos-Apapa,May,10.0,HFO,1.0,2.0,Calm,80.0\n");
        std::fs::write(&data_path, csv).unwrap();

        let config = TrainingConfig {
            data_path,
            artifacts_dir: dir.path().join("artifacts"),
            test_size: 0.01,
            ..Default::default()
        };
        // Whichever split the bad row lands in, the run fails
        assert!(run_training(&config).is_err());
        assert!(!ArtifactStore::new(&config.artifacts_dir).exists(ArtifactKind::Model));
    }
}
