//! Schema Reconciliation
//!
//! The canonical feature order is recorded once from the training rows and
//! is the only definition of what a feature vector means for a trained
//! model. Every record, training or serving, is reconciled against it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FeatureError;
use crate::record::{ColumnKind, EncodedRecord};

/// Frozen, ordered list of feature column names
///
/// Serialized as a plain JSON array of strings. Deserialization rejects
/// empty or duplicated lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CanonicalOrder {
    columns: Vec<String>,
}

impl CanonicalOrder {
    pub fn new(columns: Vec<String>) -> Result<Self, FeatureError> {
        if columns.is_empty() {
            return Err(FeatureError::SchemaMismatch(
                "canonical feature order is empty".to_string(),
            ));
        }

        {
            let mut seen = HashSet::with_capacity(columns.len());
            if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
                return Err(FeatureError::SchemaMismatch(format!(
                    "canonical feature order lists {dup:?} twice"
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Record the column order of an encoded training row
    pub fn record(encoded: &EncodedRecord) -> Result<Self, FeatureError> {
        Self::new(encoded.names().map(str::to_string).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false for a constructed order; kept for slice-like ergonomics
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of one-hot indicator columns
    pub fn indicator_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| ColumnKind::classify(c) == ColumnKind::Indicator)
            .count()
    }
}

impl TryFrom<Vec<String>> for CanonicalOrder {
    type Error = FeatureError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<CanonicalOrder> for Vec<String> {
    fn from(order: CanonicalOrder) -> Self {
        order.columns
    }
}

/// Record aligned to a canonical order, before scaling
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Values in canonical order
    pub values: Vec<f64>,
    /// Canonical columns absent from the record, filled with 0
    pub zero_filled: Vec<String>,
    /// Record columns absent from the canonical order
    pub dropped: Vec<String>,
    /// Zero-fill fraction exceeded the configured limit
    pub suspicious: bool,
}

impl Reconciled {
    pub fn zero_fill_fraction(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.zero_filled.len() as f64 / self.values.len() as f64
    }
}

const DEFAULT_MAX_ZERO_FILL_FRACTION: f64 = 0.5;

/// Aligns encoded records to a canonical order
#[derive(Debug, Clone)]
pub struct SchemaReconciler {
    /// Zero-filled share of canonical columns above which a record is flagged
    max_zero_fill_fraction: f64,
}

impl SchemaReconciler {
    /// Out-of-range limits are clamped to `[0, 1]`; NaN or infinite ones
    /// fall back to the default of 0.5.
    pub fn new(max_zero_fill_fraction: f64) -> Self {
        let max_zero_fill_fraction = if max_zero_fill_fraction.is_finite() {
            max_zero_fill_fraction.clamp(0.0, 1.0)
        } else {
            warn!(
                "Ignoring zero-fill limit {}, using {}",
                max_zero_fill_fraction, DEFAULT_MAX_ZERO_FILL_FRACTION
            );
            DEFAULT_MAX_ZERO_FILL_FRACTION
        };
        Self {
            max_zero_fill_fraction,
        }
    }

    pub fn max_zero_fill_fraction(&self) -> f64 {
        self.max_zero_fill_fraction
    }

    /// Align a record to the canonical order
    ///
    /// Missing indicator columns become 0, extra columns are dropped, and
    /// the output follows canonical order. A missing numeric column is an
    /// error: zero is only a meaningful default for an indicator.
    pub fn reconcile(
        &self,
        canonical: &CanonicalOrder,
        record: &EncodedRecord,
    ) -> Result<Reconciled, FeatureError> {
        let lookup: HashMap<&str, f64> = record.iter().map(|c| (c.name.as_str(), c.value)).collect();

        let mut values = Vec::with_capacity(canonical.len());
        let mut zero_filled = Vec::new();

        for name in canonical.columns() {
            match lookup.get(name.as_str()) {
                Some(&value) => values.push(value),
                None => {
                    if ColumnKind::classify(name) != ColumnKind::Indicator {
                        return Err(FeatureError::MissingNumericFeature(name.clone()));
                    }
                    values.push(0.0);
                    zero_filled.push(name.clone());
                }
            }
        }

        let known: HashSet<&str> = canonical.columns().iter().map(String::as_str).collect();
        let dropped: Vec<String> = record
            .iter()
            .filter(|c| !known.contains(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();

        for column in record.iter().filter(|c| !known.contains(c.name.as_str())) {
            match column.kind {
                ColumnKind::Indicator => debug!("Dropping indicator {} unknown to model", column.name),
                ColumnKind::Numeric => warn!("Dropping numeric column {} unknown to model", column.name),
            }
        }

        let mut reconciled = Reconciled {
            values,
            zero_filled,
            dropped,
            suspicious: false,
        };

        let fraction = reconciled.zero_fill_fraction();
        if fraction > self.max_zero_fill_fraction {
            warn!(
                "Zero-filled {}/{} canonical columns ({:.0}% > {:.0}%), check the loaded feature order",
                reconciled.zero_filled.len(),
                canonical.len(),
                fraction * 100.0,
                self.max_zero_fill_fraction * 100.0
            );
            reconciled.suspicious = true;
        }

        Ok(reconciled)
    }
}

impl Default for SchemaReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ZERO_FILL_FRACTION)
    }
}
