//! # City Simulation Module
//!
//! Produces the synthetic inputs a siting run optimizes against.
//!
//! ## Components
//!
//! - **Zoning**: Clustered land-use map (residential, commercial, industrial, empty)
//! - **Demand**: Baseline per-cell demand from zone base rates, time of day, season and noise
//! - **Disaster**: Post-disaster demand from earthquake, flood, power outage or storm footprints
//!
//! Every generator takes the random source as an argument, so one seeded RNG
//! threaded through the whole pipeline reproduces a run exactly.
//!
//! ## Usage
//!
//! ```rust
//! use microreactor_siting::simulation::{
//!     DemandConditions, DemandGenerator, DisasterKind, DisasterModel, DisasterSpec,
//!     ZoneClusterer,
//! };
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let grid = ZoneClusterer::default().generate(15, &mut rng).unwrap();
//! let normal =
//!     DemandGenerator::default().generate(&grid, &DemandConditions::reference(), &mut rng);
//!
//! let spec = DisasterSpec::new(DisasterKind::Earthquake, 6).unwrap();
//! let impact = DisasterModel::default().simulate(&spec, &normal, &mut rng);
//! assert!(impact.demand.total() <= normal.total());
//! ```

pub mod demand;
pub mod disaster;
pub mod zoning;

pub use demand::{DemandConditions, DemandGenerator, DemandGeneratorConfig, Season, HOURLY_FACTORS};
pub use disaster::{
    DisasterFootprint, DisasterImpact, DisasterKind, DisasterModel, DisasterShape, DisasterSpec,
    Orientation, Severity,
};
pub use zoning::{ZoneClusterer, ZoningConfig};
