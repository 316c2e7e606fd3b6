//! Scenario simulator
//!
//! Steps a [`ScenarioState`] through a fixed horizon, applying the
//! scenario's adjustment factors as their years come up.

use serde::{Deserialize, Serialize};

use crate::adjustment::AdjustmentTable;
use crate::params::ModelParameters;
use crate::state::ScenarioState;
use crate::CarbonError;

/// Longest horizon a run may request
pub const MAX_TIME_STEPS: usize = 100_000;

/// Horizon and step size for a projection run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of simulated years
    pub time_steps: usize,
    /// Step size used in the rate arithmetic [years]
    pub dt: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_steps: 30,
            dt: 1.0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), CarbonError> {
        if self.time_steps == 0 {
            return Err(CarbonError::InvalidConfig(
                "time_steps must be greater than zero".to_string(),
            ));
        }

        if self.time_steps > MAX_TIME_STEPS {
            return Err(CarbonError::InvalidConfig(format!(
                "time_steps must not exceed {MAX_TIME_STEPS}"
            )));
        }

        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(CarbonError::InvalidConfig(
                "dt must be finite and greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate, and check that every simulated year starting at `start_year` fits in an `i32`.
    pub fn validate_for(&self, start_year: i32) -> Result<(), CarbonError> {
        self.validate()?;

        if year_at(start_year, self.time_steps - 1).is_none() {
            return Err(CarbonError::InvalidConfig(format!(
                "{} steps from start_year {start_year} run past year {}",
                self.time_steps,
                i32::MAX
            )));
        }

        Ok(())
    }

    /// Simulated years for a run starting at `start_year`
    pub fn years(&self, start_year: i32) -> Vec<i32> {
        (0..self.time_steps)
            .map_while(|t| year_at(start_year, t))
            .collect()
    }
}

/// One point of an emission series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionPoint {
    pub year: i32,
    pub cumulative_emission: f64,
}

/// Cumulative emission per simulated year
pub type EmissionSeries = Vec<EmissionPoint>;

/// Full model state recorded after one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepRecord {
    pub year: i32,
    pub population: f64,
    pub gdp_per_capita: f64,
    pub energy_intensity: f64,
    pub fossil_fuel_ratio: f64,
    pub population_growth_rate: f64,
    pub gdp_growth_rate: f64,
    pub energy_intensity_decrease_rate: f64,
    pub fossil_fuel_decrease_rate: f64,
    pub gdp: f64,
    pub energy_consumption: f64,
    pub fossil_fuel_consumption: f64,
    pub annual_emission: f64,
    pub cumulative_emission: f64,
}

impl StepRecord {
    pub fn emission_point(&self) -> EmissionPoint {
        EmissionPoint {
            year: self.year,
            cumulative_emission: self.cumulative_emission,
        }
    }
}

// Years advance by one per step whatever dt is. None once past i32::MAX.
fn year_at(start_year: i32, step: usize) -> Option<i32> {
    i32::try_from(step)
        .ok()
        .and_then(|step| start_year.checked_add(step))
}

/// Run one scenario and keep every intermediate quantity.
///
/// Pure: identical inputs give bit-identical records. Never fails; extreme
/// or negative inputs propagate through the arithmetic unchanged. The run
/// ends early if a year would pass `i32::MAX`; [`SimConfig::validate_for`]
/// rejects such horizons up front.
pub fn simulate_detailed(
    params: &ModelParameters,
    adjustments: &AdjustmentTable,
    time_steps: usize,
    dt: f64,
) -> Vec<StepRecord> {
    let mut state = ScenarioState::from_params(params);
    let mut records = Vec::with_capacity(time_steps.min(MAX_TIME_STEPS));

    for step in 0..time_steps {
        let Some(year) = year_at(params.start_year, step) else {
            break;
        };

        if let Some(factors) = adjustments.get(year) {
            state.apply_factors(factors);
        }

        let flows = state.advance(params.carbon_emission_factor, dt);

        records.push(StepRecord {
            year,
            population: state.population,
            gdp_per_capita: state.gdp_per_capita,
            energy_intensity: state.energy_intensity,
            fossil_fuel_ratio: state.fossil_fuel_ratio,
            population_growth_rate: state.population_growth_rate,
            gdp_growth_rate: state.gdp_growth_rate,
            energy_intensity_decrease_rate: state.energy_intensity_decrease_rate,
            fossil_fuel_decrease_rate: state.fossil_fuel_decrease_rate,
            gdp: flows.gdp,
            energy_consumption: flows.energy_consumption,
            fossil_fuel_consumption: flows.fossil_fuel_consumption,
            annual_emission: flows.annual_emission,
            cumulative_emission: state.cumulative_emission,
        });
    }

    records
}

/// Run one scenario and return its cumulative emission series
pub fn simulate(
    params: &ModelParameters,
    adjustments: &AdjustmentTable,
    time_steps: usize,
    dt: f64,
) -> EmissionSeries {
    simulate_detailed(params, adjustments, time_steps, dt)
        .iter()
        .map(StepRecord::emission_point)
        .collect()
}
