//! MILP (Mixed-Integer Linear Programming) Placement Solver
//!
//! Exact formulation of the two-scenario siting problem handed to CBC through
//! `good_lp`:
//!
//! - `x[s] ∈ {0, 1}`: facility built at candidate `s`, with `Σ x[s] = N`
//! - `y[σ][s][c] ≥ 0`: MW of cell `c` credited to facility `s` in scenario `σ`,
//!   only for cells within the radius of `s` that carry demand
//! - per facility and scenario: `Σ_c y[σ][s][c] ≤ capacity · x[s]`
//! - per cell and scenario: `Σ_s y[σ][s][c] ≤ demand[σ][c]`
//! - maximise `w_normal · Σ y[normal] + w_disaster · Σ y[disaster]`
//!
//! The solver only chooses the sites. The reported objective is recomputed
//! with the shared allocator so it matches the coverage evaluator exactly.

use std::time::Duration;

#[cfg(feature = "optimization")]
use std::time::Instant;

#[cfg(feature = "optimization")]
use tracing::{debug, warn};

use crate::error::{Result, SitingError};
use crate::optimizer::{Placement, PlacementProblem, PlacementSolver};

/// MILP solver backed by CBC
#[derive(Debug, Clone)]
pub struct MilpSolver {
    /// Time limit in seconds passed to CBC
    pub time_limit_seconds: u64,
}

impl Default for MilpSolver {
    fn default() -> Self {
        Self {
            time_limit_seconds: 60,
        }
    }
}

impl MilpSolver {
    pub fn new(time_limit_seconds: u64) -> Self {
        Self { time_limit_seconds }
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_seconds)
    }

    #[cfg(feature = "optimization")]
    fn solve_milp(&self, problem: &PlacementProblem) -> Result<Placement> {
        use good_lp::solvers::coin_cbc::coin_cbc;
        use good_lp::{
            constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel,
            Variable,
        };

        let candidates = problem.candidates();
        let constraints = problem.constraints();
        let size = problem.normal().size();
        let scenarios = [
            (problem.normal(), constraints.weights.normal),
            (problem.disaster(), constraints.weights.disaster),
        ];

        let mut vars = variables!();
        let x: Vec<Variable> = candidates
            .iter()
            .map(|_| vars.add(variable().binary()))
            .collect();

        // (scenario, site, cell index, variable) for every in-range cell with demand
        let mut flows: Vec<(usize, usize, usize, Variable)> = Vec::new();
        let mut objective = Expression::from(0.0);
        for (scenario, (demand, weight)) in scenarios.iter().enumerate() {
            for (site_idx, site) in candidates.iter().enumerate() {
                for cell in site.neighborhood(constraints.radius, size) {
                    if demand.get(cell) <= 0.0 {
                        continue;
                    }
                    let y = vars.add(variable().min(0.0));
                    objective += *weight * y;
                    flows.push((scenario, site_idx, cell.row * size + cell.col, y));
                }
            }
        }
        debug!(
            sites = x.len(),
            flow_variables = flows.len(),
            "MILP formulation built"
        );

        let mut model = vars.maximise(objective).using(coin_cbc);
        model.set_parameter("seconds", &self.time_limit_seconds.to_string());
        model.set_parameter("log", "0");

        let built: Expression = x.iter().map(|v| Expression::from(*v)).sum();
        model = model.with(constraint!(built == problem.facility_count() as f64));

        for scenario in 0..scenarios.len() {
            let mut per_site: Vec<Expression> = vec![Expression::from(0.0); candidates.len()];
            let mut per_cell: Vec<Expression> = vec![Expression::from(0.0); size * size];
            for (_, site_idx, cell_idx, y) in flows.iter().filter(|f| f.0 == scenario) {
                per_site[*site_idx] += *y;
                per_cell[*cell_idx] += *y;
            }
            for (site_idx, served) in per_site.into_iter().enumerate() {
                model = model.with(constraint!(served <= constraints.capacity_mw * x[site_idx]));
            }
            let demand = scenarios[scenario].0;
            for (cell_idx, served) in per_cell.into_iter().enumerate() {
                let cap = demand.values()[cell_idx];
                if cap > 0.0 {
                    model = model.with(constraint!(served <= cap));
                }
            }
        }

        let started = Instant::now();
        let outcome = model.solve();
        let elapsed = started.elapsed();

        match outcome {
            Ok(solution) => {
                let sites = candidates
                    .iter()
                    .zip(&x)
                    .filter(|(_, var)| solution.value(**var) > 0.5)
                    .map(|(site, _)| *site)
                    .collect();
                if elapsed >= self.time_limit() {
                    warn!(?elapsed, "MILP solve stopped at its time limit");
                    return Err(SitingError::SolverTimeout {
                        elapsed,
                        best: Some(Box::new(problem.placement(sites, self.name(), false))),
                    });
                }
                Ok(problem.placement(sites, self.name(), true))
            }
            Err(_) if elapsed >= self.time_limit() => Err(SitingError::SolverTimeout {
                elapsed,
                best: None,
            }),
            Err(ResolutionError::Infeasible) => Err(SitingError::Infeasible {
                requested: problem.facility_count(),
                available: candidates.len(),
            }),
            Err(e) => Err(SitingError::Solver(format!("MILP solver failed: {e}"))),
        }
    }

    #[cfg(not(feature = "optimization"))]
    fn solve_milp(&self, _problem: &PlacementProblem) -> Result<Placement> {
        Err(SitingError::Solver(
            "MILP placement requires the 'optimization' feature".to_string(),
        ))
    }
}

impl PlacementSolver for MilpSolver {
    fn name(&self) -> &'static str {
        "milp"
    }

    fn solve(&self, problem: &PlacementProblem) -> Result<Placement> {
        problem.check_feasible()?;
        if problem.facility_count() == 0 {
            return Ok(problem.placement(Vec::new(), self.name(), true));
        }
        self.solve_milp(problem)
    }
}
