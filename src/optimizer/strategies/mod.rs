//! Placement Strategies
//!
//! Solver backends that need an external engine. The in-process exact and
//! heuristic solvers live next to the optimizer itself:
//! - Branch and bound: exact, default
//! - Greedy: marginal-gain heuristic
//! - MILP: CBC through `good_lp` (exact, needs the `optimization` feature)

pub mod milp;

pub use milp::*;
