//! Microreactor siting core: synthetic city demand, disaster perturbation,
//! and two-scenario facility placement with coverage evaluation.

pub mod config;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod optimizer;
pub mod scenario;
pub mod simulation;
pub mod telemetry;

pub use error::{Result, SitingError};
pub use scenario::{Scenario, ScenarioReport, StrategyComparison};
