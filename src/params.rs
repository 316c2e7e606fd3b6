//! Model parameters
//!
//! Initial conditions, baseline rates and output switches for a projection
//! run. Loaded once and shared read-only by every scenario.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Initial conditions and baseline rates for the emission model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// First simulated year
    pub start_year: i32,
    /// Population at the start year
    pub initial_population: f64,
    /// GDP per capita at the start year
    pub initial_gdp_per_capita: f64,
    /// Energy consumed per unit of GDP
    pub initial_energy_intensity: f64,
    /// Share of energy supplied by fossil fuels
    pub initial_fossil_fuel_ratio: f64,
    /// Cumulative CO2 already emitted before the start year [t]
    pub initial_co2_emission: f64,
    /// Annual population growth rate
    pub population_growth_rate: f64,
    /// Annual GDP-per-capita growth rate
    pub gdp_growth_rate: f64,
    /// Annual relative decrease of energy intensity
    pub energy_intensity_decrease_rate: f64,
    /// Annual relative decrease of the fossil-fuel share
    pub fossil_fuel_decrease_rate: f64,
    /// CO2 mass per unit of fossil energy
    pub carbon_emission_factor: f64,
    #[serde(deserialize_with = "deserialize_flag")]
    pub output_csv: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub output_image: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub output_web: bool,
}

impl ModelParameters {
    /// Parameter set used when no parameter file is available
    pub fn default_params() -> Self {
        Self {
            start_year: 2020,
            initial_population: 1_000_000.0,
            initial_gdp_per_capita: 50_000.0,
            initial_energy_intensity: 0.5,
            initial_fossil_fuel_ratio: 0.8,
            initial_co2_emission: 0.0,
            population_growth_rate: 0.01,
            gdp_growth_rate: 0.03,
            energy_intensity_decrease_rate: 0.02,
            fossil_fuel_decrease_rate: 0.01,
            carbon_emission_factor: 2.5,
            output_csv: true,
            output_image: true,
            output_web: true,
        }
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            emit_table: self.output_csv,
            render_chart: self.output_image,
            serve_view: self.output_web,
        }
    }
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self::default_params()
    }
}

/// Which collaborators run after the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputOptions {
    /// Write the result tables
    pub emit_table: bool,
    /// Render the emission chart
    pub render_chart: bool,
    /// Serve the results page
    pub serve_view: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        ModelParameters::default_params().output_options()
    }
}

/// Integer switches follow the usual truthiness: any non-zero value enables.
pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    raw.parse::<i64>().ok().map(|value| value != 0)
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| de::Error::custom(format!("invalid output flag {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_match_documented_values() {
        let params = ModelParameters::default();
        assert_eq!(params.start_year, 2020);
        assert_eq!(params.initial_population, 1_000_000.0);
        assert_eq!(params.initial_gdp_per_capita, 50_000.0);
        assert_eq!(params.initial_energy_intensity, 0.5);
        assert_eq!(params.initial_fossil_fuel_ratio, 0.8);
        assert_eq!(params.initial_co2_emission, 0.0);
        assert_eq!(params.population_growth_rate, 0.01);
        assert_eq!(params.gdp_growth_rate, 0.03);
        assert_eq!(params.energy_intensity_decrease_rate, 0.02);
        assert_eq!(params.fossil_fuel_decrease_rate, 0.01);
        assert_eq!(params.carbon_emission_factor, 2.5);
        assert_eq!(
            params.output_options(),
            OutputOptions {
                emit_table: true,
                render_chart: true,
                serve_view: true,
            }
        );
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("2"), Some(true));
        assert_eq!(parse_flag("-1"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("yes"), None);
        assert_eq!(parse_flag(""), None);
    }
}
