//! Categorical Normalization
//!
//! Weather is ordinal and maps through a fixed lookup table. Ship type,
//! route and fuel type expand into indicator columns over their closed
//! enumerations, so every record yields the same indicator set no matter
//! which values the surrounding batch contains.

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;
use crate::record::{EncodedRecord, RawRecord};

/// Fields expanded into one-hot indicator columns
pub const ONE_HOT_FIELDS: [&str; 3] = [ShipType::FIELD, RouteId::FIELD, FuelType::FIELD];

/// A closed enumeration of textual category values
pub trait Category: Sized + Copy + 'static {
    /// Source field name, also the indicator column prefix
    const FIELD: &'static str;
    /// Every known value, in indicator column order
    const ALL: &'static [Self];

    /// Textual value as it appears in requests and training data
    fn as_str(&self) -> &'static str;

    /// Parse an exact textual value
    fn parse(value: &str) -> Result<Self, FeatureError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| FeatureError::UnknownCategory {
                field: Self::FIELD,
                value: value.to_string(),
            })
    }

    /// Name of this value's indicator column
    fn indicator_name(&self) -> String {
        format!("{}_{}", Self::FIELD, self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipType {
    OilServiceBoat,
    FishingTrawler,
    SurferBoat,
    TankerShip,
}

impl Category for ShipType {
    const FIELD: &'static str = "ship_type";
    const ALL: &'static [Self] = &[
        ShipType::OilServiceBoat,
        ShipType::FishingTrawler,
        ShipType::SurferBoat,
        ShipType::TankerShip,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ShipType::OilServiceBoat => "Oil Service Boat",
            ShipType::FishingTrawler => "Fishing Trawler",
            ShipType::SurferBoat => "Surfer Boat",
            ShipType::TankerShip => "Tanker Ship",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteId {
    WarriBonny,
    PortHarcourtLagos,
    LagosApapa,
    EscravosLagos,
}

impl Category for RouteId {
    const FIELD: &'static str = "route_id";
    const ALL: &'static [Self] = &[
        RouteId::WarriBonny,
        RouteId::PortHarcourtLagos,
        RouteId::LagosApapa,
        RouteId::EscravosLagos,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            RouteId::WarriBonny => "Warri-Bonny",
            RouteId::PortHarcourtLagos => "Port Harcourt-Lagos",
            RouteId::LagosApapa => "Lagos-Apapa",
            RouteId::EscravosLagos => "Escravos-Lagos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Hfo,
    Diesel,
}

impl Category for FuelType {
    const FIELD: &'static str = "fuel_type";
    const ALL: &'static [Self] = &[FuelType::Hfo, FuelType::Diesel];

    fn as_str(&self) -> &'static str {
        match self {
            FuelType::Hfo => "HFO",
            FuelType::Diesel => "Diesel",
        }
    }
}

/// Ordinal weather scale: Calm < Moderate < Stormy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weather {
    Calm,
    Moderate,
    Stormy,
}

impl Weather {
    /// Position on the ordinal scale
    pub fn ordinal(&self) -> u8 {
        match self {
            Weather::Calm => 0,
            Weather::Moderate => 1,
            Weather::Stormy => 2,
        }
    }
}

impl Category for Weather {
    const FIELD: &'static str = "weather_conditions";
    const ALL: &'static [Self] = &[Weather::Calm, Weather::Moderate, Weather::Stormy];

    fn as_str(&self) -> &'static str {
        match self {
            Weather::Calm => "Calm",
            Weather::Moderate => "Moderate",
            Weather::Stormy => "Stormy",
        }
    }
}

/// Categorical fields of one record, parsed into their enumerations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedCategories {
    pub ship_type: ShipType,
    pub route_id: RouteId,
    pub fuel_type: FuelType,
    pub weather: Weather,
}

impl NormalizedCategories {
    /// Append every indicator column of every one-hot group
    pub fn push_indicators(&self, out: &mut EncodedRecord) {
        push_group(self.ship_type, out);
        push_group(self.route_id, out);
        push_group(self.fuel_type, out);
    }

    /// Number of indicator columns [`push_indicators`](Self::push_indicators) emits
    pub const fn indicator_count() -> usize {
        ShipType::ALL.len() + RouteId::ALL.len() + FuelType::ALL.len()
    }
}

fn push_group<C: Category + PartialEq>(selected: C, out: &mut EncodedRecord) {
    for value in C::ALL {
        out.push_indicator(value.indicator_name(), *value == selected);
    }
}

/// Maps the textual categorical fields of a raw record
pub struct CategoricalNormalizer;

impl CategoricalNormalizer {
    /// Parse every categorical field; any unknown value rejects the record
    pub fn normalize(record: &RawRecord) -> Result<NormalizedCategories, FeatureError> {
        Ok(NormalizedCategories {
            ship_type: ShipType::parse(&record.ship_type)?,
            route_id: RouteId::parse(&record.route_id)?,
            fuel_type: FuelType::parse(&record.fuel_type)?,
            weather: Weather::parse(&record.weather_conditions)?,
        })
    }
}
