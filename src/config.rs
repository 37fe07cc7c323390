use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::optimizer::constraints::validate_positive;
use crate::optimizer::{CandidatePolicy, ScenarioWeights, SitingConstraints, SolverKind};
use crate::simulation::{
    DemandConditions, DemandGeneratorConfig, DisasterKind, DisasterShape, DisasterSpec, Season,
    ZoningConfig,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub grid: GridConfig,
    #[validate(nested)]
    pub demand: DemandConfig,
    #[validate(nested)]
    pub disaster: DisasterConfig,
    #[validate(nested)]
    pub placement: PlacementConfig,
    /// Seed for the run's single random source; `None` draws from entropy
    pub random_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GridConfig {
    #[validate(range(min = 1, max = 512))]
    pub size: usize,
    #[validate(nested)]
    pub zoning: ZoningConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 15,
            zoning: ZoningConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DemandConfig {
    #[validate(range(max = 23))]
    pub hour: u32,
    pub season: Season,
    #[validate(nested)]
    pub generator: DemandGeneratorConfig,
}

impl DemandConfig {
    pub fn conditions(&self) -> Result<DemandConditions> {
        DemandConditions::new(self.hour, self.season)
    }
}

impl Default for DemandConfig {
    fn default() -> Self {
        let reference = DemandConditions::reference();
        Self {
            hour: reference.hour,
            season: reference.season,
            generator: DemandGeneratorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DisasterConfig {
    pub kind: DisasterKind,
    #[validate(range(min = 1, max = 10))]
    pub severity: u8,
    #[validate(nested)]
    pub shape: DisasterShape,
}

impl DisasterConfig {
    pub fn spec(&self) -> Result<DisasterSpec> {
        DisasterSpec::new(self.kind, self.severity)
    }
}

impl Default for DisasterConfig {
    fn default() -> Self {
        Self {
            kind: DisasterKind::Earthquake,
            severity: 6,
            shape: DisasterShape::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlacementConfig {
    pub facility_count: usize,
    #[validate(custom(function = "validate_positive"))]
    pub radius: f64,
    #[validate(custom(function = "validate_positive"))]
    pub capacity_mw: f64,
    pub candidates: CandidatePolicy,
    pub solver: SolverKind,
    /// Wall-clock budget for the solve; unset gives the exact backends 60 s
    pub time_limit_seconds: Option<u64>,
    #[validate(nested)]
    pub weights: ScenarioWeights,
}

impl PlacementConfig {
    pub fn constraints(&self) -> SitingConstraints {
        SitingConstraints {
            facility_count: self.facility_count,
            radius: self.radius,
            capacity_mw: self.capacity_mw,
            weights: self.weights,
        }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_seconds.map(Duration::from_secs)
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        let constraints = SitingConstraints::default();
        Self {
            facility_count: constraints.facility_count,
            radius: constraints.radius,
            capacity_mw: constraints.capacity_mw,
            candidates: CandidatePolicy::default(),
            solver: SolverKind::default(),
            time_limit_seconds: None,
            weights: constraints.weights,
        }
    }
}

impl Config {
    /// `config/default.toml` overridden by `SITING__*` environment variables
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("SITING__").split("__"));
        Ok(figment.extract()?)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Ok(Figment::from(Toml::string(toml)).extract()?)
    }

    /// Check every section before any computation starts
    pub fn validate_all(&self) -> Result<()> {
        self.validate()?;
        Ok(())
    }
}
