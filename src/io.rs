//! Parameter loader
//!
//! Reads the model parameter file and the per-scenario adjustment files.
//! A missing file is reported as [`LoadOutcome::Absent`] so callers can fall
//! back or skip; a file that exists but does not parse is an error.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::adjustment::{AdjustmentTable, RateFactors};
use crate::params::ModelParameters;
use crate::CarbonError;

pub const PARAMETERS_FILE_NAME: &str = "model_parameters.csv";

/// Result of looking up an optional input file
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Loaded(T),
    Absent,
}

impl<T> LoadOutcome<T> {
    pub fn loaded(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

#[derive(Debug, Deserialize)]
struct AdjustmentRow {
    year: u32,
    population_growth_rate_factor: f64,
    gdp_growth_rate_factor: f64,
    energy_intensity_decrease_rate_factor: f64,
    fossil_fuel_decrease_rate_factor: f64,
}

fn open_optional(path: &Path) -> Result<Option<File>, CarbonError> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> CarbonError + '_ {
    move |source| CarbonError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Parse a parameter table. When several data rows are present the last one wins.
pub fn read_parameters<R: Read>(reader: R, source: &Path) -> Result<ModelParameters, CarbonError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut params = None;

    for row in reader.deserialize::<ModelParameters>() {
        params = Some(row.map_err(csv_error(source))?);
    }

    params.ok_or_else(|| CarbonError::InvalidInput {
        path: source.to_path_buf(),
        message: "parameter file has no data rows".to_string(),
    })
}

/// Parse an adjustment table. A later row for the same year replaces an earlier one.
pub fn read_adjustment_table<R: Read>(
    reader: R,
    source: &Path,
) -> Result<AdjustmentTable, CarbonError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut table = AdjustmentTable::new();

    for row in reader.deserialize::<AdjustmentRow>() {
        let row = row.map_err(csv_error(source))?;
        let factors = RateFactors::new(
            row.population_growth_rate_factor,
            row.gdp_growth_rate_factor,
            row.energy_intensity_decrease_rate_factor,
            row.fossil_fuel_decrease_rate_factor,
        );
        if table.insert(row.year, factors).is_some() {
            debug!(year = row.year, path = %source.display(), "duplicate adjustment year, keeping later row");
        }
    }

    Ok(table)
}

pub fn load_parameters(path: &Path) -> Result<LoadOutcome<ModelParameters>, CarbonError> {
    match open_optional(path)? {
        Some(file) => read_parameters(file, path).map(LoadOutcome::Loaded),
        None => Ok(LoadOutcome::Absent),
    }
}

/// Load parameters, substituting the documented defaults when the file is missing.
pub fn load_parameters_or_default(path: &Path) -> Result<ModelParameters, CarbonError> {
    match load_parameters(path)? {
        LoadOutcome::Loaded(params) => Ok(params),
        LoadOutcome::Absent => {
            warn!(
                path = %path.display(),
                "model parameter file not found, using default values"
            );
            Ok(ModelParameters::default())
        }
    }
}

pub fn load_adjustment_table(path: &Path) -> Result<LoadOutcome<AdjustmentTable>, CarbonError> {
    match open_optional(path)? {
        Some(file) => read_adjustment_table(file, path).map(LoadOutcome::Loaded),
        None => Ok(LoadOutcome::Absent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "start_year,initial_population,initial_gdp_per_capita,initial_energy_intensity,initial_fossil_fuel_ratio,initial_co2_emission,population_growth_rate,gdp_growth_rate,energy_intensity_decrease_rate,fossil_fuel_decrease_rate,carbon_emission_factor,output_csv,output_image,output_web";

    #[test]
    fn test_read_parameters() {
        let data = format!("{HEADER}\n2030,500,20000,0.4,0.6,10,0.02,0.01,0.03,0.05,3,1,0,1\n");
        let params = read_parameters(data.as_bytes(), Path::new("inline.csv")).unwrap();
        assert_eq!(params.start_year, 2030);
        assert_eq!(params.initial_population, 500.0);
        assert_eq!(params.initial_co2_emission, 10.0);
        assert_eq!(params.carbon_emission_factor, 3.0);
        assert!(params.output_csv);
        assert!(!params.output_image);
        assert!(params.output_web);
    }

    #[test]
    fn test_last_parameter_row_wins() {
        let data = format!(
            "{HEADER}\n2030,500,20000,0.4,0.6,10,0.02,0.01,0.03,0.05,3,1,1,1\n2040, 700 ,20000,0.4,0.6,10,0.02,0.01,0.03,0.05,3,0,0,0\n"
        );
        let params = read_parameters(data.as_bytes(), Path::new("inline.csv")).unwrap();
        assert_eq!(params.start_year, 2040);
        assert_eq!(params.initial_population, 700.0);
        assert!(!params.output_web);
    }

    #[test]
    fn test_parameters_without_rows_is_error() {
        let err = read_parameters(HEADER.as_bytes(), Path::new("empty.csv")).unwrap_err();
        assert!(matches!(err, CarbonError::InvalidInput { .. }));
    }

    #[test]
    fn test_malformed_parameter_is_error() {
        let data = format!("{HEADER}\n2030,lots,20000,0.4,0.6,10,0.02,0.01,0.03,0.05,3,1,1,1\n");
        let err = read_parameters(data.as_bytes(), Path::new("bad.csv")).unwrap_err();
        match err {
            CarbonError::Csv { path, .. } => assert_eq!(path, Path::new("bad.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fractional_start_year_is_error() {
        let data = format!("{HEADER}\n2030.5,500,20000,0.4,0.6,10,0.02,0.01,0.03,0.05,3,1,1,1\n");
        assert!(read_parameters(data.as_bytes(), Path::new("bad.csv")).is_err());
    }

    #[test]
    fn test_invalid_flag_is_error() {
        let data = format!("{HEADER}\n2030,500,20000,0.4,0.6,10,0.02,0.01,0.03,0.05,3,maybe,1,1\n");
        assert!(read_parameters(data.as_bytes(), Path::new("bad.csv")).is_err());
    }

    #[test]
    fn test_read_adjustment_table() {
        let data = "year,population_growth_rate_factor,gdp_growth_rate_factor,energy_intensity_decrease_rate_factor,fossil_fuel_decrease_rate_factor\n\
                    2025,0.9,0.95,1.2,1.5\n\
                    2030,1,1,-1,0\n\
                    2025,0.5,0.5,0.5,0.5\n";
        let table = read_adjustment_table(data.as_bytes(), Path::new("adj.csv")).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(2025), Some(&RateFactors::new(0.5, 0.5, 0.5, 0.5)));
        assert_eq!(table.get(2030), Some(&RateFactors::new(1.0, 1.0, -1.0, 0.0)));
    }

    #[test]
    fn test_negative_adjustment_year_is_error() {
        let data = "year,population_growth_rate_factor,gdp_growth_rate_factor,energy_intensity_decrease_rate_factor,fossil_fuel_decrease_rate_factor\n\
                    -5,1,1,1,1\n";
        assert!(read_adjustment_table(data.as_bytes(), Path::new("adj.csv")).is_err());
    }

    #[test]
    fn test_missing_files_are_absent() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(load_parameters(&missing).unwrap().is_absent());
        assert!(load_adjustment_table(&missing).unwrap().is_absent());
        assert_eq!(
            load_parameters_or_default(&missing).unwrap(),
            ModelParameters::default()
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PARAMETERS_FILE_NAME);
        fs::write(
            &path,
            format!("{HEADER}\n2021,1,2,3,4,5,6,7,8,9,10,0,0,0\n"),
        )
        .unwrap();
        let params = load_parameters(&path).unwrap().loaded().unwrap();
        assert_eq!(params.start_year, 2021);
        assert_eq!(params.carbon_emission_factor, 10.0);
        assert!(!params.output_options().emit_table);
    }
}
