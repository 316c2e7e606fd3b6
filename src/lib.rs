//! Urban carbon - scenario projection of city CO2 emissions
//!
//! A compounding system-dynamics model: population, GDP per capita, energy
//! intensity and fossil-fuel share evolve under baseline rates that policy
//! scenarios rescale year by year. Each scenario yields a cumulative
//! emission series that is exported as CSV, charted, and served over HTTP.

pub mod adjustment;
pub mod io;
pub mod output;
pub mod params;
pub mod scenario;
pub mod sim;
pub mod state;
pub mod web;

use std::path::PathBuf;

use thiserror::Error;

pub use adjustment::{AdjustmentTable, RateFactors};
pub use io::{load_adjustment_table, load_parameters, LoadOutcome};
pub use params::{ModelParameters, OutputOptions};
pub use scenario::{reference_scenarios, run_scenarios, ScenarioResults, ScenarioSpec};
pub use sim::{simulate, simulate_detailed, EmissionPoint, EmissionSeries, SimConfig, StepRecord};
pub use state::ScenarioState;

#[derive(Debug, Error)]
pub enum CarbonError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("plot error: {0}")]
    Plot(String),
    #[error("invalid input in {path}: {message}")]
    InvalidInput { path: PathBuf, message: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: String,
        expected: usize,
        got: usize,
    },
}
