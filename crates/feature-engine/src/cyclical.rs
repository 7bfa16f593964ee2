//! Cyclical Month Encoding

use std::f64::consts::PI;

use crate::error::FeatureError;
use crate::record::MonthValue;

/// Month names as they appear in the training data source
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Resolve a month value to its number in 1..=12
///
/// Numeric text is accepted alongside month names so CSV sources with
/// either representation go through the same path.
pub fn month_number(month: &MonthValue) -> Result<u32, FeatureError> {
    let number = match month {
        MonthValue::Number(n) => *n,
        MonthValue::Name(name) => match MONTH_NAMES.iter().position(|m| *m == name.as_str()) {
            Some(idx) => idx as i64 + 1,
            None => name
                .trim()
                .parse::<i64>()
                .map_err(|_| FeatureError::UnknownCategory {
                    field: "month",
                    value: name.clone(),
                })?,
        },
    };

    if (1..=12).contains(&number) {
        Ok(number as u32)
    } else {
        Err(FeatureError::InvalidMonth(number))
    }
}

/// Sine/cosine position of a month on the yearly cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclicalMonth {
    pub sin: f64,
    pub cos: f64,
}

impl CyclicalMonth {
    /// Encode a month number
    pub fn encode(month: u32) -> Result<Self, FeatureError> {
        if !(1..=12).contains(&month) {
            return Err(FeatureError::InvalidMonth(i64::from(month)));
        }

        let angle = 2.0 * PI * f64::from(month) / 12.0;
        Ok(Self {
            sin: angle.sin(),
            cos: angle.cos(),
        })
    }

    /// Encode a caller-supplied month value
    pub fn from_value(month: &MonthValue) -> Result<Self, FeatureError> {
        Self::encode(month_number(month)?)
    }

    /// Euclidean distance between two encoded months
    pub fn distance(&self, other: &CyclicalMonth) -> f64 {
        ((self.sin - other.sin).powi(2) + (self.cos - other.cos).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_names_resolve() {
        assert_eq!(month_number(&"January".into()).unwrap(), 1);
        assert_eq!(month_number(&"November".into()).unwrap(), 11);
        assert_eq!(month_number(&"December".into()).unwrap(), 12);
    }

    #[test]
    fn test_numeric_text_resolves() {
        assert_eq!(month_number(&"7".into()).unwrap(), 7);
    }

    #[test]
    fn test_unknown_month_name() {
        let err = month_number(&"Smarch".into()).unwrap_err();
        assert!(matches!(err, FeatureError::UnknownCategory { field: "month", .. }));
    }

    #[test]
    fn test_month_out_of_range() {
        assert!(matches!(
            month_number(&MonthValue::Number(13)),
            Err(FeatureError::InvalidMonth(13))
        ));
        assert!(matches!(
            month_number(&MonthValue::Number(0)),
            Err(FeatureError::InvalidMonth(0))
        ));
        assert!(CyclicalMonth::encode(0).is_err());
    }

    #[test]
    fn test_encoding_formula() {
        let nov = CyclicalMonth::encode(11).unwrap();
        assert_eq!(nov.sin, (2.0 * PI * 11.0 / 12.0).sin());
        assert_eq!(nov.cos, (2.0 * PI * 11.0 / 12.0).cos());
    }

    #[test]
    fn test_december_january_are_adjacent() {
        let dec = CyclicalMonth::encode(12).unwrap();
        let jan = CyclicalMonth::encode(1).unwrap();
        let jun = CyclicalMonth::encode(6).unwrap();

        let step = 2.0 * (PI / 12.0).sin();
        assert!((dec.distance(&jan) - step).abs() < 1e-12);
        assert!(dec.distance(&jan) < dec.distance(&jun));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        for month in 1..=12 {
            let a = CyclicalMonth::encode(month).unwrap();
            let b = CyclicalMonth::encode(month).unwrap();
            assert_eq!(a.sin.to_bits(), b.sin.to_bits());
            assert_eq!(a.cos.to_bits(), b.cos.to_bits());
        }
    }
}
