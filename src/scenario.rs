//! Scenario driver
//!
//! Loads each scenario's adjustment table, skips scenarios whose source is
//! missing, and simulates the rest in parallel. Results keep the caller's
//! scenario order.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::adjustment::AdjustmentTable;
use crate::io::{load_adjustment_table, LoadOutcome};
use crate::params::ModelParameters;
use crate::sim::{simulate_detailed, EmissionPoint, EmissionSeries, SimConfig, StepRecord};
use crate::CarbonError;

/// A named scenario bound to its adjustment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioSpec {
    pub name: String,
    pub source: PathBuf,
}

impl ScenarioSpec {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

pub const REFERENCE_SCENARIOS: [(&str, &str); 3] = [
    ("Base Scenario", "base_scenario.csv"),
    ("Low-Carbon Scenario", "low_carbon_scenario.csv"),
    ("Zero-Carbon Scenario", "zero_carbon_scenario.csv"),
];

/// The three reference scenarios with their files resolved under `input_dir`
pub fn reference_scenarios(input_dir: &Path) -> Vec<ScenarioSpec> {
    REFERENCE_SCENARIOS
        .iter()
        .map(|(name, file)| ScenarioSpec::new(*name, input_dir.join(file)))
        .collect()
}

/// Detailed trajectory of one simulated scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRun {
    pub name: String,
    pub records: Vec<StepRecord>,
}

impl ScenarioRun {
    pub fn series(&self) -> EmissionSeries {
        self.records.iter().map(StepRecord::emission_point).collect()
    }

    pub fn final_point(&self) -> Option<EmissionPoint> {
        self.records.last().map(StepRecord::emission_point)
    }
}

/// Outcome of a driver pass over a scenario list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioResults {
    /// Simulated scenarios, in the order they were requested
    pub runs: Vec<ScenarioRun>,
    /// Scenarios whose adjustment source was missing
    pub skipped: Vec<String>,
}

impl ScenarioResults {
    pub fn get(&self, name: &str) -> Option<&ScenarioRun> {
        self.runs.iter().find(|run| run.name == name)
    }

    pub fn series(&self, name: &str) -> Option<EmissionSeries> {
        self.get(name).map(ScenarioRun::series)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.runs.iter().map(|run| run.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Simulate scenarios whose tables are already resolved.
///
/// `Absent` entries are recorded as skipped. Each run gets its own state, so
/// the parallel map needs no coordination beyond the ordered collect.
pub fn run_tables(
    params: &ModelParameters,
    tables: Vec<(String, LoadOutcome<AdjustmentTable>)>,
    config: &SimConfig,
) -> Result<ScenarioResults, CarbonError> {
    config.validate_for(params.start_year)?;

    let mut skipped = Vec::new();
    let mut present = Vec::with_capacity(tables.len());
    for (name, outcome) in tables {
        match outcome {
            LoadOutcome::Loaded(table) => present.push((name, table)),
            LoadOutcome::Absent => skipped.push(name),
        }
    }

    let runs = present
        .into_par_iter()
        .map(|(name, table)| ScenarioRun {
            records: simulate_detailed(params, &table, config.time_steps, config.dt),
            name,
        })
        .collect();

    Ok(ScenarioResults { runs, skipped })
}

/// Load every scenario's adjustment file, then simulate those that exist.
///
/// A missing file skips only that scenario. A file that fails to parse
/// aborts the whole pass.
pub fn run_scenarios(
    params: &ModelParameters,
    scenarios: &[ScenarioSpec],
    config: &SimConfig,
) -> Result<ScenarioResults, CarbonError> {
    let mut tables = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        let outcome = load_adjustment_table(&scenario.source)?;
        match &outcome {
            LoadOutcome::Loaded(table) => info!(
                scenario = %scenario.name,
                adjustments = table.len(),
                "loaded adjustment table"
            ),
            LoadOutcome::Absent => warn!(
                scenario = %scenario.name,
                path = %scenario.source.display(),
                "adjustment file not found, skipping scenario"
            ),
        }
        tables.push((scenario.name.clone(), outcome));
    }

    run_tables(params, tables, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::RateFactors;
    use crate::sim::simulate;

    fn green_table() -> AdjustmentTable {
        [(2022, RateFactors::new(0.5, 0.8, 2.0, 3.0))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_reference_scenarios() {
        let specs = reference_scenarios(Path::new("inputs"));
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Base Scenario", "Low-Carbon Scenario", "Zero-Carbon Scenario"]
        );
        assert_eq!(specs[1].source, Path::new("inputs").join("low_carbon_scenario.csv"));
    }

    #[test]
    fn test_absent_scenario_is_skipped() {
        let params = ModelParameters::default();
        let results = run_tables(
            &params,
            vec![
                ("A".to_string(), LoadOutcome::Loaded(AdjustmentTable::new())),
                ("B".to_string(), LoadOutcome::Absent),
                ("C".to_string(), LoadOutcome::Loaded(green_table())),
            ],
            &SimConfig::default(),
        )
        .unwrap();

        assert_eq!(results.names().collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(results.skipped, vec!["B".to_string()]);
        assert!(results.get("B").is_none());
        assert_eq!(results.series("A").map(|s| s.len()), Some(30));
    }

    #[test]
    fn test_scenarios_do_not_share_state() {
        let params = ModelParameters::default();
        let config = SimConfig::default();
        let together = run_tables(
            &params,
            vec![
                ("green".to_string(), LoadOutcome::Loaded(green_table())),
                ("base".to_string(), LoadOutcome::Loaded(AdjustmentTable::new())),
            ],
            &config,
        )
        .unwrap();

        let base_alone = simulate(&params, &AdjustmentTable::new(), 30, 1.0);
        let green_alone = simulate(&params, &green_table(), 30, 1.0);
        assert_eq!(together.series("base"), Some(base_alone.clone()));
        assert_eq!(together.series("green"), Some(green_alone.clone()));
        assert_ne!(base_alone, green_alone);
    }

    #[test]
    fn test_order_follows_request() {
        let params = ModelParameters::default();
        let names = ["z", "m", "a", "q", "b", "k", "c", "x"];
        let tables = names
            .iter()
            .map(|name| (name.to_string(), LoadOutcome::Loaded(AdjustmentTable::new())))
            .collect();
        let results = run_tables(&params, tables, &SimConfig::default()).unwrap();
        assert_eq!(results.names().collect::<Vec<_>>(), names.to_vec());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let params = ModelParameters::default();
        let config = SimConfig {
            time_steps: 0,
            dt: 1.0,
        };
        assert!(run_tables(&params, Vec::new(), &config).is_err());
    }

    #[test]
    fn test_horizon_past_year_range_rejected() {
        let params = ModelParameters {
            start_year: i32::MAX - 1,
            ..ModelParameters::default()
        };
        let tables = vec![("A".to_string(), LoadOutcome::Loaded(AdjustmentTable::new()))];
        let err = run_tables(&params, tables, &SimConfig::default()).unwrap_err();
        assert!(matches!(err, CarbonError::InvalidConfig(_)));
    }
}
