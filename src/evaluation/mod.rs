//! # Coverage Evaluation
//!
//! Scores a facility set against demand matrices. Uses the same capacity
//! sharing as the optimizer, so the evaluated coverage of a placement
//! reproduces its objective exactly.

pub mod coverage;

pub use coverage::{CoverageResult, ScenarioCoverage};

use crate::domain::{DemandMatrix, FacilitySet};

/// Coverage of one scenario
pub fn evaluate(demand: &DemandMatrix, facilities: &FacilitySet) -> ScenarioCoverage {
    ScenarioCoverage::calculate(demand, facilities)
}

/// Coverage of both scenarios plus the combined metrics
pub fn evaluate_scenarios(
    normal: &DemandMatrix,
    disaster: &DemandMatrix,
    facilities: &FacilitySet,
) -> CoverageResult {
    CoverageResult::calculate(normal, disaster, facilities)
}
