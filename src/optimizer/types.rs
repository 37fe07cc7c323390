use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{info, warn};

use super::allocation::allocate;
use super::{
    BranchAndBoundSolver, GreedySolver, MilpSolver, ScenarioWeights, SitingConstraints,
    WeightingPreset,
};
use crate::domain::{Cell, DemandMatrix, FacilitySet};
use crate::error::{Result, SitingError};

/// Candidate counts above this make exact solves slow
const LARGE_PROBLEM_CANDIDATES: usize = 1_600;

/// One two-scenario placement problem. Owns its inputs.
#[derive(Debug, Clone)]
pub struct PlacementProblem {
    candidates: Vec<Cell>,
    normal: DemandMatrix,
    disaster: DemandMatrix,
    constraints: SitingConstraints,
}

impl PlacementProblem {
    /// Candidates are sorted row-major and deduplicated. Shape mismatches,
    /// out-of-grid candidates and negative or NaN parameters are rejected.
    pub fn new(
        mut candidates: Vec<Cell>,
        normal: DemandMatrix,
        disaster: DemandMatrix,
        constraints: SitingConstraints,
    ) -> Result<Self> {
        if normal.size() != disaster.size() {
            return Err(SitingError::invalid(format!(
                "normal demand is {0}x{0} but disaster demand is {1}x{1}",
                normal.size(),
                disaster.size()
            )));
        }
        let size = normal.size();
        if let Some(cell) = candidates
            .iter()
            .find(|cell| cell.row >= size || cell.col >= size)
        {
            return Err(SitingError::invalid(format!(
                "candidate site ({}, {}) outside {size}x{size} grid",
                cell.row, cell.col
            )));
        }
        if !(constraints.radius >= 0.0) {
            return Err(SitingError::invalid("radius must be non-negative"));
        }
        if !(constraints.capacity_mw >= 0.0) {
            return Err(SitingError::invalid("capacity must be non-negative"));
        }
        if !(constraints.weights.normal >= 0.0 && constraints.weights.disaster >= 0.0) {
            return Err(SitingError::invalid("scenario weights must be non-negative"));
        }

        candidates.sort();
        candidates.dedup();
        Ok(Self {
            candidates,
            normal,
            disaster,
            constraints,
        })
    }

    pub fn candidates(&self) -> &[Cell] {
        &self.candidates
    }

    pub fn normal(&self) -> &DemandMatrix {
        &self.normal
    }

    pub fn disaster(&self) -> &DemandMatrix {
        &self.disaster
    }

    pub fn constraints(&self) -> &SitingConstraints {
        &self.constraints
    }

    pub fn facility_count(&self) -> usize {
        self.constraints.facility_count
    }

    pub fn weights(&self) -> ScenarioWeights {
        self.constraints.weights
    }

    /// Same inputs under different scenario weights
    pub fn with_weights(&self, weights: ScenarioWeights) -> Self {
        let mut problem = self.clone();
        problem.constraints.weights = weights;
        problem
    }

    pub fn check_feasible(&self) -> Result<()> {
        if self.facility_count() > self.candidates.len() {
            return Err(SitingError::Infeasible {
                requested: self.facility_count(),
                available: self.candidates.len(),
            });
        }
        Ok(())
    }

    /// Credited demand `(normal, disaster)` for a set of sites
    pub fn scenario_coverage(&self, sites: &[Cell]) -> (f64, f64) {
        let radius = self.constraints.radius;
        let capacity = self.constraints.capacity_mw;
        (
            allocate(&self.normal, sites, radius, capacity).covered_mw,
            allocate(&self.disaster, sites, radius, capacity).covered_mw,
        )
    }

    /// Weighted objective of a set of sites
    pub fn objective_for(&self, sites: &[Cell]) -> f64 {
        let (normal, disaster) = self.scenario_coverage(sites);
        self.constraints.weights.combine(normal, disaster)
    }

    /// Package a site selection, recomputing its objective from scratch
    pub fn placement(&self, sites: Vec<Cell>, solver: &str, optimal: bool) -> Placement {
        let objective = self.objective_for(&sites);
        Placement {
            facilities: FacilitySet::new(
                sites,
                self.constraints.radius,
                self.constraints.capacity_mw,
            ),
            objective,
            weights: self.constraints.weights,
            solver: solver.to_string(),
            optimal,
        }
    }
}

/// Selected facility sites and the objective they achieve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub facilities: FacilitySet,
    pub objective: f64,
    pub weights: ScenarioWeights,
    /// Backend that produced the placement
    pub solver: String,
    /// Whether the backend proved the objective optimal
    pub optimal: bool,
}

impl Placement {
    pub fn sites(&self) -> &[Cell] {
        self.facilities.sites()
    }
}

/// Narrow adapter every placement backend implements
#[cfg_attr(test, mockall::automock)]
pub trait PlacementSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, problem: &PlacementProblem) -> Result<Placement>;
}

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
pub enum SolverKind {
    #[default]
    BranchAndBound,
    Greedy,
    Milp,
}

impl SolverKind {
    pub fn build(&self, time_limit: Option<Duration>) -> Box<dyn PlacementSolver> {
        match self {
            SolverKind::BranchAndBound => Box::new(BranchAndBoundSolver::bounded(time_limit)),
            SolverKind::Greedy => Box::new(GreedySolver),
            SolverKind::Milp => Box::new(match time_limit {
                Some(limit) => MilpSolver::new(limit.as_secs().max(1)),
                None => MilpSolver::default(),
            }),
        }
    }
}

/// Placement under one named weighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPlacement {
    pub preset: WeightingPreset,
    pub placement: Placement,
}

pub struct PlacementOptimizer {
    pub solver: Box<dyn PlacementSolver>,
}

impl PlacementOptimizer {
    pub fn new(solver: Box<dyn PlacementSolver>) -> Self {
        Self { solver }
    }

    pub fn from_kind(kind: SolverKind, time_limit: Option<Duration>) -> Self {
        Self::new(kind.build(time_limit))
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// Select `constraints.facility_count` sites among `candidate_sites`
    pub fn optimize(
        &self,
        candidate_sites: Vec<Cell>,
        normal: &DemandMatrix,
        disaster: &DemandMatrix,
        constraints: &SitingConstraints,
    ) -> Result<Placement> {
        let problem = PlacementProblem::new(
            candidate_sites,
            normal.clone(),
            disaster.clone(),
            constraints.clone(),
        )?;
        self.solve(&problem)
    }

    pub fn solve(&self, problem: &PlacementProblem) -> Result<Placement> {
        problem.check_feasible()?;
        if problem.candidates().len() > LARGE_PROBLEM_CANDIDATES {
            warn!(
                candidates = problem.candidates().len(),
                solver = self.solver.name(),
                "large candidate set, solve may be slow"
            );
        }

        let placement = self.solver.solve(problem)?;
        info!(
            solver = %placement.solver,
            facilities = placement.facilities.len(),
            objective = placement.objective,
            optimal = placement.optimal,
            "placement found"
        );
        Ok(placement)
    }

    /// Solve the same problem under every weighting preset
    pub fn compare_weightings(&self, problem: &PlacementProblem) -> Result<Vec<WeightedPlacement>> {
        WeightingPreset::iter()
            .map(|preset| {
                let placement = self.solve(&problem.with_weights(preset.weights()))?;
                Ok(WeightedPlacement { preset, placement })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cells_of;

    fn problem(size: usize, facility_count: usize) -> PlacementProblem {
        let normal = DemandMatrix::from_fn(size, |cell| (cell.row + cell.col) as f64);
        let disaster = normal.map(|_, v| v * 0.5);
        let constraints = SitingConstraints {
            facility_count,
            radius: 1.0,
            capacity_mw: 5.0,
            weights: ScenarioWeights::default(),
        };
        PlacementProblem::new(cells_of(size).collect(), normal, disaster, constraints).unwrap()
    }

    #[test]
    fn test_problem_rejects_bad_inputs() {
        let a = DemandMatrix::zeros(3);
        let b = DemandMatrix::zeros(4);
        let constraints = SitingConstraints::default();
        assert!(PlacementProblem::new(vec![], a.clone(), b, constraints.clone()).is_err());
        assert!(
            PlacementProblem::new(vec![Cell::new(3, 0)], a.clone(), a.clone(), constraints.clone())
                .is_err()
        );
        let negative = SitingConstraints {
            radius: -1.0,
            ..constraints
        };
        assert!(PlacementProblem::new(vec![], a.clone(), a, negative).is_err());
    }

    #[test]
    fn test_candidates_sorted_and_deduplicated() {
        let demand = DemandMatrix::zeros(3);
        let problem = PlacementProblem::new(
            vec![Cell::new(2, 2), Cell::new(0, 1), Cell::new(2, 2)],
            demand.clone(),
            demand,
            SitingConstraints::default(),
        )
        .unwrap();
        assert_eq!(problem.candidates(), &[Cell::new(0, 1), Cell::new(2, 2)]);
    }

    #[test]
    fn test_infeasible_when_too_few_candidates() {
        let problem = problem(2, 5);
        match problem.check_feasible() {
            Err(SitingError::Infeasible {
                requested,
                available,
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(available, 4);
            }
            other => panic!("expected Infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_placement_objective_matches_weights() {
        let problem = problem(4, 1);
        let sites = vec![Cell::new(3, 3)];
        let (normal, disaster) = problem.scenario_coverage(&sites);
        let placement = problem.placement(sites, "test", false);
        assert_eq!(placement.objective, normal + 2.0 * disaster);
        assert_eq!(placement.facilities.radius, 1.0);
        assert_eq!(placement.solver, "test");
    }

    #[test]
    fn test_with_weights_keeps_inputs() {
        let problem = problem(3, 1);
        let balanced = problem.with_weights(WeightingPreset::Balanced.weights());
        assert_eq!(balanced.weights(), ScenarioWeights::new(1.0, 1.0));
        assert_eq!(balanced.candidates(), problem.candidates());
    }

    #[test]
    fn test_solver_kind_parsing() {
        assert_eq!(
            "branch_and_bound".parse::<SolverKind>().unwrap(),
            SolverKind::BranchAndBound
        );
        assert_eq!(SolverKind::Greedy.build(None).name(), "greedy");
    }
}
