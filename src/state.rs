//! Working state of a single scenario run
//!
//! A fresh [`ScenarioState`] is built from the model parameters for every
//! run and dropped when the run ends, so nothing carries over between
//! scenarios.

use crate::adjustment::RateFactors;
use crate::params::ModelParameters;

/// Mutable per-run model variables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioState {
    pub population: f64,
    pub gdp_per_capita: f64,
    pub energy_intensity: f64,
    pub fossil_fuel_ratio: f64,
    pub population_growth_rate: f64,
    pub gdp_growth_rate: f64,
    pub energy_intensity_decrease_rate: f64,
    pub fossil_fuel_decrease_rate: f64,
    pub cumulative_emission: f64,
}

/// Quantities derived from the state after an update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualFlows {
    pub gdp: f64,
    pub energy_consumption: f64,
    pub fossil_fuel_consumption: f64,
    pub annual_emission: f64,
}

impl ScenarioState {
    /// Start-of-run state taken directly from the parameters
    pub fn from_params(params: &ModelParameters) -> Self {
        Self {
            population: params.initial_population,
            gdp_per_capita: params.initial_gdp_per_capita,
            energy_intensity: params.initial_energy_intensity,
            fossil_fuel_ratio: params.initial_fossil_fuel_ratio,
            population_growth_rate: params.population_growth_rate,
            gdp_growth_rate: params.gdp_growth_rate,
            energy_intensity_decrease_rate: params.energy_intensity_decrease_rate,
            fossil_fuel_decrease_rate: params.fossil_fuel_decrease_rate,
            cumulative_emission: params.initial_co2_emission,
        }
    }

    /// Rescale the running rates. The new rates persist for the rest of the run.
    pub fn apply_factors(&mut self, factors: &RateFactors) {
        self.population_growth_rate *= factors.population_growth;
        self.gdp_growth_rate *= factors.gdp_growth;
        self.energy_intensity_decrease_rate *= factors.energy_intensity_decrease;
        self.fossil_fuel_decrease_rate *= factors.fossil_fuel_decrease;
    }

    /// Advance one step: update stocks, derive flows, accumulate emission.
    ///
    /// No clamping is done; negative rates or stocks propagate as-is.
    pub fn advance(&mut self, carbon_emission_factor: f64, dt: f64) -> AnnualFlows {
        self.population *= 1.0 + self.population_growth_rate * dt;
        self.gdp_per_capita *= 1.0 + self.gdp_growth_rate * dt;
        self.energy_intensity *= 1.0 - self.energy_intensity_decrease_rate * dt;
        self.fossil_fuel_ratio *= 1.0 - self.fossil_fuel_decrease_rate * dt;

        let gdp = self.population * self.gdp_per_capita;
        let energy_consumption = gdp * self.energy_intensity;
        let fossil_fuel_consumption = energy_consumption * self.fossil_fuel_ratio;
        let annual_emission = fossil_fuel_consumption * carbon_emission_factor;

        self.cumulative_emission += annual_emission * dt;

        AnnualFlows {
            gdp,
            energy_consumption,
            fossil_fuel_consumption,
            annual_emission,
        }
    }
}
