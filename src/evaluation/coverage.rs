use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{DemandMatrix, FacilitySet};
use crate::optimizer::{allocate, ScenarioWeights};

/// Coverage of a single demand scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCoverage {
    /// Total demand in the scenario (MW)
    pub total_demand_mw: f64,
    /// Demand credited to facilities (MW)
    pub covered_demand_mw: f64,
    /// Covered share of total demand (%), 0 when there is no demand
    pub coverage_pct: f64,
    /// Mean number of facilities in range over the cells that receive coverage
    pub redundancy: f64,
    /// Cells receiving any coverage
    pub covered_cells: usize,
}

impl ScenarioCoverage {
    pub fn calculate(demand: &DemandMatrix, facilities: &FacilitySet) -> Self {
        let allocation = allocate(
            demand,
            facilities.sites(),
            facilities.radius,
            facilities.capacity_mw,
        );

        let total_demand_mw = demand.total();
        let covered_demand_mw = allocation.covered_mw;
        let coverage_pct = if total_demand_mw > 0.0 {
            covered_demand_mw / total_demand_mw * 100.0
        } else {
            0.0
        };

        let reach: Vec<usize> = allocation
            .covered
            .iter()
            .zip(&allocation.reach_count)
            .filter(|(covered, _)| **covered > 0.0)
            .map(|(_, reach)| *reach)
            .collect();
        let redundancy = if reach.is_empty() {
            0.0
        } else {
            reach.iter().sum::<usize>() as f64 / reach.len() as f64
        };

        Self {
            total_demand_mw,
            covered_demand_mw,
            coverage_pct,
            redundancy,
            covered_cells: reach.len(),
        }
    }

    pub fn uncovered_demand_mw(&self) -> f64 {
        self.total_demand_mw - self.covered_demand_mw
    }
}

/// Coverage metrics of a placement under both scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub normal: ScenarioCoverage,
    pub disaster: ScenarioCoverage,
    /// Nameplate capacity of all placed facilities (MW)
    pub total_capacity_mw: f64,
    pub facility_count: usize,
    /// Mean facilities in range per covered cell, normal scenario
    pub redundancy: f64,
    /// Mean of the two coverage percentages
    pub coverage_efficiency: f64,
}

impl CoverageResult {
    pub fn calculate(
        normal: &DemandMatrix,
        disaster: &DemandMatrix,
        facilities: &FacilitySet,
    ) -> Self {
        let normal = ScenarioCoverage::calculate(normal, facilities);
        let disaster = ScenarioCoverage::calculate(disaster, facilities);
        let coverage_efficiency = (normal.coverage_pct + disaster.coverage_pct) / 2.0;

        Self {
            redundancy: normal.redundancy,
            total_capacity_mw: facilities.total_capacity_mw(),
            facility_count: facilities.len(),
            coverage_efficiency,
            normal,
            disaster,
        }
    }

    /// Weighted objective the placement achieves under `weights`
    pub fn weighted_objective(&self, weights: &ScenarioWeights) -> f64 {
        weights.combine(
            self.normal.covered_demand_mw,
            self.disaster.covered_demand_mw,
        )
    }
}

impl fmt::Display for CoverageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} facilities ({:.1} MW): normal {:.1}/{:.1} MW ({:.1}%), disaster {:.1}/{:.1} MW ({:.1}%), redundancy {:.2}",
            self.facility_count,
            self.total_capacity_mw,
            self.normal.covered_demand_mw,
            self.normal.total_demand_mw,
            self.normal.coverage_pct,
            self.disaster.covered_demand_mw,
            self.disaster.total_demand_mw,
            self.disaster.coverage_pct,
            self.redundancy
        )
    }
}
