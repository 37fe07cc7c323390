//! End-to-end siting run: zone map → baseline demand → disaster → placement →
//! coverage metrics, all driven by one random source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{Cell, DemandMatrix, FacilitySet, Grid, ZoneStatistics, ZoneType};
use crate::error::Result;
use crate::evaluation::CoverageResult;
use crate::optimizer::{
    Placement, PlacementOptimizer, PlacementProblem, PlacementSolver, WeightingPreset,
};
use crate::simulation::{DemandGenerator, DisasterImpact, DisasterModel, ZoneClusterer};

/// Configured pipeline. Validation happens once, in [`Scenario::new`].
pub struct Scenario {
    config: Config,
    clusterer: ZoneClusterer,
    generator: DemandGenerator,
    disaster_model: DisasterModel,
    optimizer: PlacementOptimizer,
}

impl Scenario {
    pub fn new(config: Config) -> Result<Self> {
        config.validate_all()?;
        // Fail on bad conditions or severity before any computation
        config.demand.conditions()?;
        config.disaster.spec()?;

        Ok(Self {
            clusterer: ZoneClusterer::new(config.grid.zoning.clone())?,
            generator: DemandGenerator::new(config.demand.generator.clone())?,
            disaster_model: DisasterModel::new(config.disaster.shape.clone())?,
            optimizer: PlacementOptimizer::from_kind(
                config.placement.solver,
                config.placement.time_limit(),
            ),
            config,
        })
    }

    /// Replace the configured placement backend
    pub fn with_solver(mut self, solver: Box<dyn PlacementSolver>) -> Self {
        self.optimizer = PlacementOptimizer::new(solver);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run with the configured seed, or a fresh one drawn from entropy. The
    /// seed used is recorded in the report.
    pub fn run(&self) -> Result<ScenarioReport> {
        let seed = self.config.random_seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut report = self.run_with_rng(&mut rng)?;
        report.seed = Some(seed);
        Ok(report)
    }

    pub fn run_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ScenarioReport> {
        let run_id = Uuid::new_v4();
        let conditions = self.config.demand.conditions()?;
        let spec = self.config.disaster.spec()?;

        let grid = self.clusterer.generate(self.config.grid.size, rng)?;
        info!(
            %run_id,
            size = grid.size(),
            residential = grid.count(ZoneType::Residential),
            commercial = grid.count(ZoneType::Commercial),
            industrial = grid.count(ZoneType::Industrial),
            "grid generated"
        );

        let normal = self.generator.generate(&grid, &conditions, rng);
        info!(%run_id, total_mw = normal.total(), "baseline demand generated");

        let disaster = self.disaster_model.simulate(&spec, &normal, rng);

        let candidates = self.config.placement.candidates.candidates(&grid);
        let placement = self.optimizer.optimize(
            candidates,
            &normal,
            &disaster.demand,
            &self.config.placement.constraints(),
        )?;

        let coverage = CoverageResult::calculate(&normal, &disaster.demand, &placement.facilities);
        info!(
            %run_id,
            normal_pct = coverage.normal.coverage_pct,
            disaster_pct = coverage.disaster.coverage_pct,
            redundancy = coverage.redundancy,
            "coverage evaluated"
        );

        Ok(ScenarioReport {
            run_id,
            seed: None,
            grid,
            normal,
            disaster,
            placement,
            coverage,
        })
    }

    /// Demand `hours` after the disaster of a finished run
    pub fn recovered_demand(&self, report: &ScenarioReport, hours: f64) -> DemandMatrix {
        self.disaster_model.recover(&report.disaster, &report.normal, hours)
    }

    /// Re-solve a finished run under every weighting preset
    pub fn compare_strategies(&self, report: &ScenarioReport) -> Result<Vec<StrategyComparison>> {
        let problem = PlacementProblem::new(
            self.config.placement.candidates.candidates(&report.grid),
            report.normal.clone(),
            report.disaster.demand.clone(),
            self.config.placement.constraints(),
        )?;

        let comparisons = self
            .optimizer
            .compare_weightings(&problem)?
            .into_iter()
            .map(|weighted| StrategyComparison {
                preset: weighted.preset,
                coverage: CoverageResult::calculate(
                    &report.normal,
                    &report.disaster.demand,
                    &weighted.placement.facilities,
                ),
                placement: weighted.placement,
            })
            .collect();
        Ok(comparisons)
    }
}

/// Everything a run produced, for rendering and export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    pub seed: Option<u64>,
    pub grid: Grid,
    pub normal: DemandMatrix,
    pub disaster: DisasterImpact,
    pub placement: Placement,
    pub coverage: CoverageResult,
}

impl ScenarioReport {
    pub fn zones(&self) -> &Grid {
        &self.grid
    }

    pub fn zone_map(&self) -> Vec<Vec<ZoneType>> {
        self.grid.rows()
    }

    pub fn normal_demand(&self) -> &DemandMatrix {
        &self.normal
    }

    pub fn disaster_demand(&self) -> &DemandMatrix {
        &self.disaster.demand
    }

    /// Per-cell `normal - disaster`
    pub fn impact_differential(&self) -> Vec<Vec<f64>> {
        self.normal.difference(&self.disaster.demand)
    }

    pub fn zone_statistics(&self) -> Vec<ZoneStatistics> {
        self.normal.zone_statistics(&self.grid)
    }

    pub fn facilities(&self) -> &FacilitySet {
        &self.placement.facilities
    }

    pub fn sites(&self) -> &[Cell] {
        self.placement.sites()
    }

    pub fn metrics(&self) -> &CoverageResult {
        &self.coverage
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub preset: WeightingPreset,
    pub placement: Placement,
    pub coverage: CoverageResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SitingError;
    use crate::optimizer::MockPlacementSolver;
    use std::time::Duration;

    fn small_config(facility_count: usize) -> Config {
        let mut config = Config::default();
        config.grid.size = 6;
        config.placement.facility_count = facility_count;
        config.placement.radius = 2.0;
        config.placement.capacity_mw = 10.0;
        config.random_seed = Some(17);
        config
    }

    #[test]
    fn test_run_produces_consistent_report() {
        let report = Scenario::new(small_config(2)).unwrap().run().unwrap();
        assert_eq!(report.seed, Some(17));
        assert_eq!(report.grid.cell_count(), 36);
        assert_eq!(report.sites().len(), 2);
        assert_eq!(report.impact_differential().len(), 6);
        assert!(report.disaster_demand().total() <= report.normal_demand().total());
        assert_eq!(
            report.metrics().weighted_objective(&report.placement.weights),
            report.placement.objective
        );
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let mut config = small_config(2);
        config.disaster.severity = 12;
        assert!(matches!(
            Scenario::new(config),
            Err(SitingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_infeasible_never_reaches_solver() {
        let mut config = small_config(40);
        config.grid.size = 3;
        let mut solver = MockPlacementSolver::new();
        solver.expect_name().return_const("mock");
        solver.expect_solve().times(0);

        let scenario = Scenario::new(config).unwrap().with_solver(Box::new(solver));
        match scenario.run() {
            Err(SitingError::Infeasible {
                requested,
                available,
            }) => {
                assert_eq!(requested, 40);
                assert_eq!(available, 9);
            }
            other => panic!("expected Infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_solver_timeout_propagates_best_placement() {
        let mut solver = MockPlacementSolver::new();
        solver.expect_name().return_const("mock");
        solver.expect_solve().times(1).returning(|problem| {
            Err(SitingError::SolverTimeout {
                elapsed: Duration::from_secs(2),
                best: Some(Box::new(problem.placement(
                    problem.candidates()[..2].to_vec(),
                    "mock",
                    false,
                ))),
            })
        });

        let scenario = Scenario::new(small_config(2))
            .unwrap()
            .with_solver(Box::new(solver));
        match scenario.run() {
            Err(SitingError::SolverTimeout { best: Some(best), .. }) => {
                assert_eq!(best.sites(), &[Cell::new(0, 0), Cell::new(0, 1)]);
                assert!(!best.optimal);
            }
            other => panic!("expected SolverTimeout, got {other:?}"),
        }
    }

    #[test]
    fn test_recovered_demand_between_disaster_and_normal() {
        let scenario = Scenario::new(small_config(1)).unwrap();
        let report = scenario.run().unwrap();

        assert_eq!(&scenario.recovered_demand(&report, 0.0), report.disaster_demand());
        let day_after = scenario.recovered_demand(&report, 24.0);
        assert!(day_after.total() >= report.disaster_demand().total());
        assert!(day_after.total() <= report.normal_demand().total());
    }

    #[test]
    fn test_compare_strategies_covers_every_preset() {
        let scenario = Scenario::new(small_config(1)).unwrap();
        let report = scenario.run().unwrap();
        let comparisons = scenario.compare_strategies(&report).unwrap();

        assert_eq!(comparisons.len(), 3);
        let resilience = &comparisons[0];
        assert_eq!(resilience.preset, WeightingPreset::ResiliencePriority);
        assert_eq!(resilience.placement.objective, report.placement.objective);
        for comparison in &comparisons {
            assert_eq!(
                comparison.coverage.weighted_objective(&comparison.placement.weights),
                comparison.placement.objective
            );
        }
    }
}
