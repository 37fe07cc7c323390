//! Exact placement by depth-first branch and bound.
//!
//! Credited coverage is a maximum flow from the chosen facilities, which is a
//! monotone submodular function of the site set; so is any non-negative
//! weighting of the two scenarios. At a node with objective `f(S)` and `k`
//! sites left to place, no completion can beat `f(S)` plus the `k` largest
//! single-site gains `f(S + c) - f(S)`. Candidates are explored in order of
//! decreasing gain and the first one whose bound cannot beat the incumbent
//! ends the node.

use std::time::{Duration, Instant};

use ordered_float::OrderedFloat;
use tracing::{debug, warn};

use super::{GreedySolver, Placement, PlacementProblem, PlacementSolver};
use crate::domain::Cell;
use crate::error::{Result, SitingError};

/// Objective improvements at or below this are treated as ties
const OBJECTIVE_EPSILON: f64 = 1e-9;

/// Budget for configured runs that set no time limit. Four or more
/// facilities on a 15x15 grid can take tens of seconds to prove.
pub const DEFAULT_SEARCH_LIMIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default)]
pub struct BranchAndBoundSolver {
    /// Wall-clock budget for the search; `None` searches to completion
    pub time_limit: Option<Duration>,
}

impl BranchAndBoundSolver {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self { time_limit }
    }

    /// Solver for a configured run: `None` falls back to [`DEFAULT_SEARCH_LIMIT`]
    pub fn bounded(time_limit: Option<Duration>) -> Self {
        Self::new(Some(time_limit.unwrap_or(DEFAULT_SEARCH_LIMIT)))
    }
}

struct Search<'a> {
    problem: &'a PlacementProblem,
    deadline: Option<Instant>,
    best_sites: Vec<Cell>,
    best_value: f64,
    nodes: u64,
    pruned: u64,
    timed_out: bool,
}

impl Search<'_> {
    fn explore(&mut self, chosen: &mut Vec<Cell>, value: f64, allowed: &[Cell]) {
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            self.timed_out = true;
            return;
        }
        self.nodes += 1;

        let remaining = self.problem.facility_count() - chosen.len();
        if remaining == 0 {
            if value > self.best_value + OBJECTIVE_EPSILON {
                self.best_value = value;
                self.best_sites = chosen.clone();
            }
            return;
        }
        if allowed.len() < remaining {
            return;
        }

        let mut scored: Vec<(Cell, f64)> = allowed
            .iter()
            .map(|candidate| {
                chosen.push(*candidate);
                let objective = self.problem.objective_for(chosen);
                chosen.pop();
                (*candidate, objective)
            })
            .collect();
        // Stable: equal objectives keep row-major order
        scored.sort_by_key(|(_, objective)| std::cmp::Reverse(OrderedFloat(*objective)));
        let gains: Vec<f64> = scored.iter().map(|(_, objective)| objective - value).collect();

        for pos in 0..=(scored.len() - remaining) {
            let bound = value + gains[pos..pos + remaining].iter().sum::<f64>();
            if bound <= self.best_value + OBJECTIVE_EPSILON {
                self.pruned += 1;
                break;
            }

            let (site, objective) = scored[pos];
            let rest: Vec<Cell> = scored[pos + 1..].iter().map(|(cell, _)| *cell).collect();
            chosen.push(site);
            self.explore(chosen, objective, &rest);
            chosen.pop();
            if self.timed_out {
                return;
            }
        }
    }
}

impl PlacementSolver for BranchAndBoundSolver {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    fn solve(&self, problem: &PlacementProblem) -> Result<Placement> {
        problem.check_feasible()?;
        let started = Instant::now();

        let (incumbent, incumbent_value) = GreedySolver::select(problem);
        let mut search = Search {
            problem,
            deadline: self.time_limit.map(|limit| started + limit),
            best_sites: incumbent,
            best_value: incumbent_value,
            nodes: 0,
            pruned: 0,
            timed_out: false,
        };
        search.explore(&mut Vec::new(), 0.0, problem.candidates());

        debug!(
            nodes = search.nodes,
            pruned = search.pruned,
            objective = search.best_value,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "branch and bound finished"
        );

        if search.timed_out {
            let elapsed = started.elapsed();
            warn!(?elapsed, nodes = search.nodes, "placement search hit its time limit");
            return Err(SitingError::SolverTimeout {
                elapsed,
                best: Some(Box::new(problem.placement(
                    search.best_sites,
                    self.name(),
                    false,
                ))),
            });
        }
        Ok(problem.placement(search.best_sites, self.name(), true))
    }
}
