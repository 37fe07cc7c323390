pub mod allocation;
pub mod branch_bound;
pub mod constraints;
pub mod greedy;
pub mod strategies;
pub mod types;

pub use allocation::{allocate, Allocation, FLOW_EPSILON};
pub use branch_bound::*;
pub use constraints::*;
pub use greedy::*;
pub use strategies::*;
pub use types::*;
