use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::{Validate, ValidationError};

use crate::domain::{Cell, Grid, ZoneType};

/// Relative importance of the two scenarios in the objective
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ScenarioWeights {
    #[validate(range(min = 0.0))]
    pub normal: f64,
    #[validate(range(min = 0.0))]
    pub disaster: f64,
}

impl ScenarioWeights {
    pub const fn new(normal: f64, disaster: f64) -> Self {
        Self { normal, disaster }
    }

    /// Weighted objective from the two covered totals
    #[inline]
    pub fn combine(&self, normal_covered: f64, disaster_covered: f64) -> f64 {
        self.normal * normal_covered + self.disaster * disaster_covered
    }
}

impl Default for ScenarioWeights {
    /// Resilience priority: disaster coverage counts double
    fn default() -> Self {
        WeightingPreset::ResiliencePriority.weights()
    }
}

/// Named weightings used when comparing placement strategies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeightingPreset {
    ResiliencePriority,
    Balanced,
    DisasterOnly,
}

impl WeightingPreset {
    pub fn weights(&self) -> ScenarioWeights {
        match self {
            WeightingPreset::ResiliencePriority => ScenarioWeights::new(1.0, 2.0),
            WeightingPreset::Balanced => ScenarioWeights::new(1.0, 1.0),
            WeightingPreset::DisasterOnly => ScenarioWeights::new(0.0, 1.0),
        }
    }
}

/// Which cells may host a facility
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CandidatePolicy {
    #[default]
    AllCells,
    NonEmptyZones,
}

impl CandidatePolicy {
    /// Candidate sites in row-major order
    pub fn candidates(&self, grid: &Grid) -> Vec<Cell> {
        match self {
            CandidatePolicy::AllCells => grid.cells().collect(),
            CandidatePolicy::NonEmptyZones => grid
                .cells()
                .filter(|cell| grid.zone(*cell) != ZoneType::Empty)
                .collect(),
        }
    }
}

/// Placement parameters shared by every facility of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SitingConstraints {
    /// Number of facilities to place
    pub facility_count: usize,
    /// Coverage radius in cells
    #[validate(custom(function = "validate_positive"))]
    pub radius: f64,
    /// Per-facility capacity in MW
    #[validate(custom(function = "validate_positive"))]
    pub capacity_mw: f64,
    #[validate(nested)]
    pub weights: ScenarioWeights,
}

impl Default for SitingConstraints {
    fn default() -> Self {
        Self {
            facility_count: 3,
            radius: 4.0,
            capacity_mw: 15.0,
            weights: ScenarioWeights::default(),
        }
    }
}

/// Strictly positive, finite
pub(crate) fn validate_positive(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_favor_disaster() {
        let weights = ScenarioWeights::default();
        assert_eq!(weights.combine(10.0, 4.0), 18.0);
        assert_eq!(WeightingPreset::Balanced.weights().combine(10.0, 4.0), 14.0);
        assert_eq!(WeightingPreset::DisasterOnly.weights().combine(10.0, 4.0), 4.0);
    }

    #[test]
    fn test_candidate_policies() {
        let grid = Grid::from_zones(
            2,
            vec![
                ZoneType::Empty,
                ZoneType::Industrial,
                ZoneType::Residential,
                ZoneType::Empty,
            ],
        )
        .unwrap();
        assert_eq!(CandidatePolicy::AllCells.candidates(&grid).len(), 4);
        assert_eq!(
            CandidatePolicy::NonEmptyZones.candidates(&grid),
            vec![Cell::new(0, 1), Cell::new(1, 0)]
        );
    }

    #[test]
    fn test_constraint_validation() {
        assert!(SitingConstraints::default().validate().is_ok());

        let zero_radius = SitingConstraints {
            radius: 0.0,
            ..Default::default()
        };
        assert!(zero_radius.validate().is_err());

        let nan_capacity = SitingConstraints {
            capacity_mw: f64::NAN,
            ..Default::default()
        };
        assert!(nan_capacity.validate().is_err());

        let negative_weight = SitingConstraints {
            weights: ScenarioWeights::new(-1.0, 2.0),
            ..Default::default()
        };
        assert!(negative_weight.validate().is_err());
    }

    #[test]
    fn test_validate_positive_takes_field_by_value() {
        assert!(validate_positive(0.25).is_ok());
        for bad in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(validate_positive(bad).is_err(), "accepted {bad}");
        }

        let infinite_radius = SitingConstraints {
            radius: f64::INFINITY,
            ..Default::default()
        };
        assert!(infinite_radius.validate().is_err());
    }
}
