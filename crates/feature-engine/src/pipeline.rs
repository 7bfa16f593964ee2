//! Transformation Pipeline
//!
//! The single implementation of `raw record -> feature vector`. The batch
//! trainer calls [`TransformationPipeline::fit_transform`], the serving path
//! calls [`TransformationPipeline::transform`]; both encode through
//! [`TransformationPipeline::encode`].

use data_validator::{ValidationConfig, Validator};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::categorical::{CategoricalNormalizer, NormalizedCategories};
use crate::cyclical::CyclicalMonth;
use crate::error::FeatureError;
use crate::record::{columns, EncodedRecord, RawRecord};
use crate::scaler::FittedScaler;
use crate::schema::{CanonicalOrder, Reconciled, SchemaReconciler};
use crate::FeatureVector;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Zero-filled share of canonical columns above which a record is flagged
    pub max_zero_fill_fraction: f64,
    /// Numeric field ranges
    pub validation: ValidationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_zero_fill_fraction: 0.5,
            validation: ValidationConfig::default(),
        }
    }
}

/// Everything the training path produces
#[derive(Debug, Clone)]
pub struct TrainingOutput {
    /// Scaled training matrix, one row per record, canonical column order
    pub features: Array2<f64>,
    pub canonical_order: CanonicalOrder,
    pub scaler: FittedScaler,
}

/// A single record through the serving path
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    pub vector: FeatureVector,
    pub zero_filled: Vec<String>,
    pub dropped: Vec<String>,
    pub suspicious: bool,
}

/// Composes validation, categorical normalization, cyclical encoding,
/// schema reconciliation and scaling
#[derive(Debug, Clone)]
pub struct TransformationPipeline {
    validator: Validator,
    reconciler: SchemaReconciler,
}

impl TransformationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            validator: Validator::new(config.validation),
            reconciler: SchemaReconciler::new(config.max_zero_fill_fraction),
        }
    }

    pub fn reconciler(&self) -> &SchemaReconciler {
        &self.reconciler
    }

    /// Encode one raw record
    pub fn encode(&self, record: &RawRecord) -> Result<EncodedRecord, FeatureError> {
        self.validator
            .validate_record_fields(record.distance, record.engine_efficiency)?;
        let categories = CategoricalNormalizer::normalize(record)?;
        let month = CyclicalMonth::from_value(&record.month)?;

        let mut encoded = EncodedRecord::with_capacity(
            columns::NUMERIC.len() + NormalizedCategories::indicator_count(),
        );
        encoded.push_numeric(columns::DISTANCE, record.distance);
        encoded.push_numeric(columns::ENGINE_EFFICIENCY, record.engine_efficiency);
        encoded.push_numeric(columns::WEATHER_CONDITIONS, f64::from(categories.weather.ordinal()));
        encoded.push_numeric(columns::MONTH_SIN, month.sin);
        encoded.push_numeric(columns::MONTH_COS, month.cos);
        categories.push_indicators(&mut encoded);

        Ok(encoded)
    }

    /// Encode and reconcile a record, without scaling
    pub fn reconcile(
        &self,
        record: &RawRecord,
        canonical: &CanonicalOrder,
    ) -> Result<Reconciled, FeatureError> {
        let encoded = self.encode(record)?;
        self.reconciler.reconcile(canonical, &encoded)
    }

    /// Training path: record the canonical order, fit the scaler, scale
    ///
    /// Any invalid record rejects the whole batch.
    pub fn fit_transform(&self, records: &[RawRecord]) -> Result<TrainingOutput, FeatureError> {
        let first = records.first().ok_or(FeatureError::EmptyBatch)?;
        let canonical_order = CanonicalOrder::record(&self.encode(first)?)?;

        let mut flat = Vec::with_capacity(records.len() * canonical_order.len());
        for (idx, record) in records.iter().enumerate() {
            let reconciled = self.reconcile(record, &canonical_order)?;
            if !reconciled.zero_filled.is_empty() || !reconciled.dropped.is_empty() {
                return Err(FeatureError::SchemaMismatch(format!(
                    "training row {idx} does not share the recorded column set"
                )));
            }
            flat.extend(reconciled.values);
        }

        let raw = Array2::from_shape_vec((records.len(), canonical_order.len()), flat)?;
        let scaler = FittedScaler::fit(&raw)?;
        let features = scaler.transform(&raw)?;

        info!(
            "Fitted feature pipeline on {} records ({} features, {} indicators)",
            records.len(),
            canonical_order.len(),
            canonical_order.indicator_count()
        );

        Ok(TrainingOutput {
            features,
            canonical_order,
            scaler,
        })
    }

    /// Serving path for a single record
    pub fn transform(
        &self,
        record: &RawRecord,
        canonical: &CanonicalOrder,
        scaler: &FittedScaler,
    ) -> Result<TransformedRecord, FeatureError> {
        let reconciled = self.reconcile(record, canonical)?;
        let vector = scaler.transform_row(&reconciled.values)?;

        debug!(
            "Transformed record: {} features, {} zero-filled, {} dropped",
            vector.len(),
            reconciled.zero_filled.len(),
            reconciled.dropped.len()
        );

        Ok(TransformedRecord {
            vector,
            zero_filled: reconciled.zero_filled,
            dropped: reconciled.dropped,
            suspicious: reconciled.suspicious,
        })
    }

    /// Serving path applied to many records, e.g. a held-out evaluation set
    pub fn transform_batch(
        &self,
        records: &[RawRecord],
        canonical: &CanonicalOrder,
        scaler: &FittedScaler,
    ) -> Result<Array2<f64>, FeatureError> {
        let mut flat = Vec::with_capacity(records.len() * canonical.len());
        for record in records {
            flat.extend(self.transform(record, canonical, scaler)?.vector);
        }
        Ok(Array2::from_shape_vec((records.len(), canonical.len()), flat)?)
    }
}

impl Default for TransformationPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
