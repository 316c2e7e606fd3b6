//! Per-year rate adjustments for a policy scenario

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Multiplicative factors applied to the four baseline rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateFactors {
    pub population_growth: f64,
    pub gdp_growth: f64,
    pub energy_intensity_decrease: f64,
    pub fossil_fuel_decrease: f64,
}

impl RateFactors {
    pub fn new(
        population_growth: f64,
        gdp_growth: f64,
        energy_intensity_decrease: f64,
        fossil_fuel_decrease: f64,
    ) -> Self {
        Self {
            population_growth,
            gdp_growth,
            energy_intensity_decrease,
            fossil_fuel_decrease,
        }
    }

    /// Factors that leave every rate unchanged
    pub fn identity() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

/// Sparse map from absolute year to rate factors.
///
/// A factor applied in year Y rescales the running rate from Y onward; it
/// is never undone. Years missing from the table leave the rates as they
/// are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentTable {
    factors: BTreeMap<u32, RateFactors>,
}

impl AdjustmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert factors for a year, replacing any earlier entry for that year
    pub fn insert(&mut self, year: u32, factors: RateFactors) -> Option<RateFactors> {
        self.factors.insert(year, factors)
    }

    /// Factors for a simulated year; negative years never match
    pub fn get(&self, year: i32) -> Option<&RateFactors> {
        u32::try_from(year)
            .ok()
            .and_then(|year| self.factors.get(&year))
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &RateFactors)> {
        self.factors.iter().map(|(&year, factors)| (year, factors))
    }
}

impl FromIterator<(u32, RateFactors)> for AdjustmentTable {
    fn from_iter<I: IntoIterator<Item = (u32, RateFactors)>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_entry_replaces_earlier() {
        let mut table = AdjustmentTable::new();
        assert!(table.insert(2025, RateFactors::new(0.5, 1.0, 1.0, 1.0)).is_none());
        let previous = table.insert(2025, RateFactors::new(2.0, 1.0, 1.0, 1.0));
        assert_eq!(previous.map(|f| f.population_growth), Some(0.5));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(2025).map(|f| f.population_growth), Some(2.0));
    }

    #[test]
    fn test_negative_year_never_matches() {
        let table: AdjustmentTable = [(0, RateFactors::identity())].into_iter().collect();
        assert!(table.get(0).is_some());
        assert!(table.get(-1).is_none());
        assert!(table.get(1).is_none());
    }
}
