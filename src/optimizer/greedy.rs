use tracing::debug;

use super::{Placement, PlacementProblem, PlacementSolver};
use crate::domain::Cell;
use crate::error::Result;

/// Marginal-gain heuristic: repeatedly add the candidate that raises the
/// weighted objective the most. Ties go to the earlier candidate in row-major
/// order.
///
/// Not optimal in general; serves as a baseline to compare the exact solvers
/// against and as their starting incumbent.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl GreedySolver {
    /// Greedy site selection and its objective
    pub(crate) fn select(problem: &PlacementProblem) -> (Vec<Cell>, f64) {
        let mut remaining: Vec<Cell> = problem.candidates().to_vec();
        let mut chosen: Vec<Cell> = Vec::with_capacity(problem.facility_count());
        let mut value = 0.0;

        for _ in 0..problem.facility_count() {
            let mut best: Option<(usize, f64)> = None;
            for (idx, candidate) in remaining.iter().enumerate() {
                chosen.push(*candidate);
                let objective = problem.objective_for(&chosen);
                chosen.pop();
                if best.map_or(true, |(_, b)| objective > b) {
                    best = Some((idx, objective));
                }
            }
            let Some((idx, objective)) = best else {
                break;
            };
            chosen.push(remaining.remove(idx));
            value = objective;
        }

        debug!(sites = ?chosen, objective = value, "greedy selection");
        (chosen, value)
    }
}

impl PlacementSolver for GreedySolver {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn solve(&self, problem: &PlacementProblem) -> Result<Placement> {
        problem.check_feasible()?;
        let (sites, _) = Self::select(problem);
        let proven = sites.is_empty() || sites.len() == problem.candidates().len();
        Ok(problem.placement(sites, self.name(), proven))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{cells_of, DemandMatrix};
    use crate::optimizer::{ScenarioWeights, SitingConstraints};

    #[test]
    fn test_greedy_picks_heaviest_cell_first() {
        let mut values = vec![1.0; 25];
        values[12] = 20.0;
        let demand = DemandMatrix::from_values(5, values);
        let problem = PlacementProblem::new(
            cells_of(5).collect(),
            demand.clone(),
            demand,
            SitingConstraints {
                facility_count: 1,
                radius: 0.5,
                capacity_mw: 100.0,
                weights: ScenarioWeights::default(),
            },
        )
        .unwrap();

        // Each site reaches only its own cell, so the heavy cell is the unique best
        let placement = GreedySolver.solve(&problem).unwrap();
        assert_eq!(placement.sites(), &[Cell::new(2, 2)]);
        assert_eq!(placement.objective, 3.0 * 20.0);
        assert_eq!(placement.solver, "greedy");
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let demand = DemandMatrix::from_values(3, vec![1.0; 9]);
        let problem = PlacementProblem::new(
            cells_of(3).collect(),
            demand.clone(),
            demand,
            SitingConstraints {
                facility_count: 1,
                radius: 5.0,
                capacity_mw: 2.0,
                weights: ScenarioWeights::default(),
            },
        )
        .unwrap();
        // Every cell reaches the whole grid and is capacity bound
        let placement = GreedySolver.solve(&problem).unwrap();
        assert_eq!(placement.sites(), &[Cell::new(0, 0)]);
    }

    #[test]
    fn test_shared_reach_ties_resolve_row_major() {
        let mut values = vec![1.0; 25];
        values[12] = 20.0;
        let demand = DemandMatrix::from_values(5, values);
        let problem = PlacementProblem::new(
            cells_of(5).collect(),
            demand.clone(),
            demand,
            SitingConstraints {
                facility_count: 1,
                radius: 1.0,
                capacity_mw: 100.0,
                weights: ScenarioWeights::default(),
            },
        )
        .unwrap();

        // (1, 2) and (2, 2) both reach the heavy cell plus four unit cells
        let placement = GreedySolver.solve(&problem).unwrap();
        assert_eq!(placement.sites(), &[Cell::new(1, 2)]);
        assert_eq!(placement.objective, 3.0 * 24.0);
    }

    #[test]
    fn test_zero_facilities() {
        let demand = DemandMatrix::from_values(2, vec![1.0; 4]);
        let problem = PlacementProblem::new(
            cells_of(2).collect(),
            demand.clone(),
            demand,
            SitingConstraints {
                facility_count: 0,
                ..Default::default()
            },
        )
        .unwrap();
        let placement = GreedySolver.solve(&problem).unwrap();
        assert!(placement.sites().is_empty());
        assert_eq!(placement.objective, 0.0);
        assert!(placement.optimal);
    }
}
