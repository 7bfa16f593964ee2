//! Feature Transformation Engine
//!
//! Turns raw voyage records into the scaled, fixed-order feature vectors a
//! fuel consumption model is trained and served on. Training and serving go
//! through the same [`TransformationPipeline`], so both sides share one
//! categorical mapping, one cyclical month encoding and one column order.

mod categorical;
mod cyclical;
mod error;
mod pipeline;
mod record;
mod scaler;
mod schema;

pub use categorical::{
    Category, CategoricalNormalizer, FuelType, NormalizedCategories, RouteId, ShipType, Weather,
    ONE_HOT_FIELDS,
};
pub use cyclical::{month_number, CyclicalMonth, MONTH_NAMES};
pub use error::FeatureError;
pub use pipeline::{PipelineConfig, TrainingOutput, TransformationPipeline, TransformedRecord};
pub use record::{columns, ColumnKind, EncodedColumn, EncodedRecord, MonthValue, RawRecord};
pub use scaler::FittedScaler;
pub use schema::{CanonicalOrder, Reconciled, SchemaReconciler};

/// Final model input, ordered as the canonical feature order
pub type FeatureVector = Vec<f64>;
