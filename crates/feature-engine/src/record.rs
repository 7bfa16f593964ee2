//! Raw and Encoded Voyage Records

use serde::{Deserialize, Serialize};

use crate::categorical::ONE_HOT_FIELDS;

/// Names of the non-indicator columns
pub mod columns {
    pub const DISTANCE: &str = "distance";
    pub const ENGINE_EFFICIENCY: &str = "engine_efficiency";
    pub const WEATHER_CONDITIONS: &str = "weather_conditions";
    pub const MONTH_SIN: &str = "month_sin";
    pub const MONTH_COS: &str = "month_cos";

    /// Numeric columns in the order the encoder emits them
    pub const NUMERIC: [&str; 5] = [
        DISTANCE,
        ENGINE_EFFICIENCY,
        WEATHER_CONDITIONS,
        MONTH_SIN,
        MONTH_COS,
    ];
}

/// Month as supplied by the caller
///
/// The request boundary sends a number, the training source a month name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonthValue {
    Number(i64),
    Name(String),
}

impl From<u32> for MonthValue {
    fn from(month: u32) -> Self {
        MonthValue::Number(i64::from(month))
    }
}

impl From<&str> for MonthValue {
    fn from(name: &str) -> Self {
        MonthValue::Name(name.to_string())
    }
}

/// One voyage observation, exactly as received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Distance travelled (nautical miles)
    pub distance: f64,
    /// Engine efficiency (%)
    pub engine_efficiency: f64,
    pub ship_type: String,
    pub route_id: String,
    pub fuel_type: String,
    pub weather_conditions: String,
    pub month: MonthValue,
}

/// Whether a column may be zero-filled during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Raw or derived quantity; never zero-filled
    Numeric,
    /// One-hot indicator; absence means "not this category"
    Indicator,
}

impl ColumnKind {
    /// Classify a column by name
    ///
    /// Indicator columns are exactly those named `<one-hot field>_<value>`.
    pub fn classify(name: &str) -> Self {
        let is_indicator = ONE_HOT_FIELDS.iter().any(|field| {
            name.strip_prefix(field)
                .and_then(|rest| rest.strip_prefix('_'))
                .map_or(false, |value| !value.is_empty())
        });

        if is_indicator {
            ColumnKind::Indicator
        } else {
            ColumnKind::Numeric
        }
    }
}

/// A single named column of an encoded record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub name: String,
    pub value: f64,
    pub kind: ColumnKind,
}

/// Record after categorical normalization and cyclical encoding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodedRecord {
    columns: Vec<EncodedColumn>,
}

impl EncodedRecord {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    pub fn push_numeric(&mut self, name: &str, value: f64) {
        self.columns.push(EncodedColumn {
            name: name.to_string(),
            value,
            kind: ColumnKind::Numeric,
        });
    }

    pub fn push_indicator(&mut self, name: String, present: bool) {
        self.columns.push(EncodedColumn {
            name,
            value: if present { 1.0 } else { 0.0 },
            kind: ColumnKind::Indicator,
        });
    }

    /// Look up a column value by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.value)
    }

    /// Column names in emission order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EncodedColumn> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_indicator_columns() {
        assert_eq!(ColumnKind::classify("ship_type_Tanker Ship"), ColumnKind::Indicator);
        assert_eq!(ColumnKind::classify("route_id_Lagos-Apapa"), ColumnKind::Indicator);
        assert_eq!(ColumnKind::classify("fuel_type_HFO"), ColumnKind::Indicator);
    }

    #[test]
    fn test_classify_numeric_columns() {
        for name in columns::NUMERIC {
            assert_eq!(ColumnKind::classify(name), ColumnKind::Numeric);
        }
        // Bare field names and lookalikes are not indicators
        assert_eq!(ColumnKind::classify("ship_type"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::classify("ship_type_"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::classify("ship_typeX"), ColumnKind::Numeric);
    }

    #[test]
    fn test_month_value_from_json() {
        let number: MonthValue = serde_json::from_str("11").unwrap();
        assert_eq!(number, MonthValue::Number(11));

        let name: MonthValue = serde_json::from_str("\"November\"").unwrap();
        assert_eq!(name, MonthValue::Name("November".to_string()));
    }

    #[test]
    fn test_encoded_record_lookup() {
        let mut record = EncodedRecord::default();
        record.push_numeric(columns::DISTANCE, 12.5);
        record.push_indicator("fuel_type_HFO".to_string(), true);

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("distance"), Some(12.5));
        assert_eq!(record.get("fuel_type_HFO"), Some(1.0));
        assert_eq!(record.get("fuel_type_Diesel"), None);
    }
}
