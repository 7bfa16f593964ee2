//! Training data loading and splitting

use anyhow::{bail, Context, Result};
use csv::Reader;
use feature_engine::{MonthValue, RawRecord};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// One row of the voyage log
///
/// `ship_id` and `CO2_emissions` are present in the file but never read:
/// the first is an identifier and the second is derived from the target.
#[derive(Debug, Deserialize)]
struct VoyageRow {
    ship_type: String,
    route_id: String,
    month: MonthValue,
    distance: f64,
    fuel_type: String,
    fuel_consumption: f64,
    weather_conditions: String,
    engine_efficiency: f64,
}

impl VoyageRow {
    fn into_sample(self) -> (RawRecord, f64) {
        let record = RawRecord {
            distance: self.distance,
            engine_efficiency: self.engine_efficiency,
            ship_type: self.ship_type,
            route_id: self.route_id,
            fuel_type: self.fuel_type,
            weather_conditions: self.weather_conditions,
            month: self.month,
        };
        (record, self.fuel_consumption)
    }
}

/// Raw records with their fuel consumption targets
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<RawRecord>,
    pub targets: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, record: RawRecord, target: f64) {
        self.records.push(record);
        self.targets.push(target);
    }

    /// Seeded shuffle split into `(train, test)`
    ///
    /// The test share is rounded up; both halves keep at least one row.
    pub fn split(&self, test_size: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            bail!("test size must be strictly between 0 and 1, got {test_size}");
        }
        if self.len() < 2 {
            bail!("need at least two rows to split, got {}", self.len());
        }

        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let n_test = ((self.len() as f64 * test_size).ceil() as usize).clamp(1, self.len() - 1);
        let (test_idx, train_idx) = indices.split_at(n_test);

        Ok((self.select(train_idx), self.select(test_idx)))
    }

    fn select(&self, indices: &[usize]) -> Dataset {
        let mut out = Dataset::default();
        for &i in indices {
            out.push(self.records[i].clone(), self.targets[i]);
        }
        out
    }
}

/// Load the voyage log from a CSV file with a header row
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open training data: {:?}", path.as_ref()))?;

    let mut reader = Reader::from_reader(file);
    let mut dataset = Dataset::default();

    for (line, result) in reader.deserialize::<VoyageRow>().enumerate() {
        // Header is line 1
        let row = result.with_context(|| format!("Failed to parse row at line {}", line + 2))?;
        let (record, target) = row.into_sample();
        dataset.push(record, target);
    }

    if dataset.is_empty() {
        bail!("training data {:?} has no rows", path.as_ref());
    }

    debug!("First record: {:?}", dataset.records.first());
    info!("Loaded {} voyages from {:?}", dataset.len(), path.as_ref());
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "ship_id,ship_type,route_id,month,distance,fuel_type,fuel_consumption,CO2_emissions,weather_conditions,engine_efficiency";

    fn csv_file(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file
    }

    #[test]
    fn test_load_month_names_and_numbers() {
        let file = csv_file(&[
            "NG001,Oil Service Boat,Warri-Bonny,January,132.26,HFO,3779.77,10625.76,Stormy,92.14",
            "NG002,Tanker Ship,Lagos-Apapa,11,300.5,Diesel,5000.0,14000.0,Calm,80.0",
        ]);

        let data = load_dataset(file.path()).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.records[0].month, MonthValue::Name("January".to_string()));
        assert_eq!(data.records[1].month, MonthValue::Number(11));
        assert_eq!(data.records[0].ship_type, "Oil Service Boat");
        assert_eq!(data.targets, vec![3779.77, 5000.0]);
    }

    #[test]
    fn test_malformed_row_fails() {
        let file = csv_file(&["NG001,Oil Service Boat,Warri-Bonny,January,far,HFO,1.0,1.0,Calm,90.0"]);
        assert!(load_dataset(file.path()).is_err());
    }

    #[test]
    fn test_empty_file_fails() {
        let file = csv_file(&[]);
        assert!(load_dataset(file.path()).is_err());
    }

    fn numbered(n: usize) -> Dataset {
        let mut data = Dataset::default();
        for i in 0..n {
            data.push(
                RawRecord {
                    distance: 1.0 + i as f64,
                    engine_efficiency: 80.0,
                    ship_type: "Surfer Boat".to_string(),
                    route_id: "Lagos-Apapa".to_string(),
                    fuel_type: "Diesel".to_string(),
                    weather_conditions: "Calm".to_string(),
                    month: MonthValue::Number(1),
                },
                i as f64,
            );
        }
        data
    }

    #[test]
    fn test_split_is_seeded_and_disjoint() {
        let data = numbered(10);
        let (train, test) = data.split(0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let mut all: Vec<f64> = train.targets.iter().chain(&test.targets).copied().collect();
        all.sort_by(f64::total_cmp);
        assert_eq!(all, data.targets);

        let (_, again) = data.split(0.2, 42).unwrap();
        assert_eq!(again.targets, test.targets);
    }

    #[test]
    fn test_split_bounds() {
        let data = numbered(3);
        assert!(data.split(0.0, 1).is_err());
        assert!(data.split(1.0, 1).is_err());
        assert!(numbered(1).split(0.5, 1).is_err());

        let (train, test) = data.split(0.9, 1).unwrap();
        assert_eq!((train.len(), test.len()), (1, 2));
    }
}
