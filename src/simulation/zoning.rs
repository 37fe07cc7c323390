//! # Zone Clustering
//!
//! Generates the land-use map. Each developed zone type receives a handful of
//! clusters; a cluster is seeded on an empty cell and grows outward over
//! 4-connected neighbours, with the chance of claiming a cell falling off with
//! Manhattan distance from the seed. Cells no cluster reaches stay `Empty`.
//!
//! Clusters never overwrite each other, so every seeded zone type is present
//! in the final map as long as the grid has room for its seed.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::domain::{Cell, Grid, ZoneType};
use crate::error::Result;

/// Sampling attempts for an interior seed before falling back to a full scan
const SEED_ATTEMPTS: usize = 16;

/// Margin kept between cluster seeds and the grid edge when the grid allows it
const SEED_MARGIN: usize = 2;

/// Cluster shaping parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_cluster_bounds"))]
#[serde(default)]
pub struct ZoningConfig {
    /// Minimum clusters seeded per developed zone type
    #[validate(range(min = 1))]
    pub clusters_min: usize,
    /// Maximum clusters seeded per developed zone type
    #[validate(range(min = 1, max = 64))]
    pub clusters_max: usize,
    /// Largest Manhattan distance a cluster may grow from its seed
    #[validate(range(min = 1, max = 32))]
    pub max_growth_radius: usize,
    /// Claim probability lost per unit of distance from the seed
    #[validate(range(min = 0.0, max = 1.0))]
    pub growth_decay: f64,
    /// Floor on the claim probability inside the growth radius
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_claim_probability: f64,
}

impl Default for ZoningConfig {
    fn default() -> Self {
        Self {
            clusters_min: 2,
            clusters_max: 4,
            max_growth_radius: 3,
            growth_decay: 0.2,
            min_claim_probability: 0.1,
        }
    }
}

fn validate_cluster_bounds(config: &ZoningConfig) -> std::result::Result<(), ValidationError> {
    if config.clusters_min > config.clusters_max {
        return Err(ValidationError::new("clusters_min_exceeds_clusters_max"));
    }
    Ok(())
}

/// Builds clustered zone maps from an explicit random source
#[derive(Debug, Clone, Default)]
pub struct ZoneClusterer {
    config: ZoningConfig,
}

impl ZoneClusterer {
    pub fn new(config: ZoningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ZoningConfig {
        &self.config
    }

    /// Generate a `size × size` zone map.
    ///
    /// Cluster counts are drawn per zone type up front, then clusters are
    /// seeded round-robin (residential, commercial, industrial) so no type is
    /// starved of room on small grids.
    pub fn generate<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Result<Grid> {
        let mut grid = Grid::new(size)?;

        let plan: Vec<(ZoneType, usize)> = ZoneType::DEVELOPED
            .iter()
            .map(|zone| {
                (
                    *zone,
                    rng.gen_range(self.config.clusters_min..=self.config.clusters_max),
                )
            })
            .collect();
        let rounds = plan.iter().map(|(_, n)| *n).max().unwrap_or(0);

        for round in 0..rounds {
            for (zone, clusters) in &plan {
                if round < *clusters {
                    self.grow_cluster(&mut grid, *zone, rng);
                }
            }
        }

        debug!(
            size,
            residential = grid.count(ZoneType::Residential),
            commercial = grid.count(ZoneType::Commercial),
            industrial = grid.count(ZoneType::Industrial),
            empty = grid.count(ZoneType::Empty),
            "zone map generated"
        );
        Ok(grid)
    }

    fn grow_cluster<R: Rng + ?Sized>(&self, grid: &mut Grid, zone: ZoneType, rng: &mut R) {
        let Some(seed) = pick_seed(grid, rng) else {
            return;
        };
        grid.set_zone(seed, zone);

        let radius = rng.gen_range(1..=self.config.max_growth_radius);
        let size = grid.size();
        let mut visited = vec![false; size * size];
        visited[seed.row * size + seed.col] = true;

        let mut frontier = VecDeque::from([seed]);
        while let Some(cell) = frontier.pop_front() {
            let neighbours: Vec<Cell> = grid.neighbors4(cell).collect();
            for next in neighbours {
                let idx = next.row * size + next.col;
                if visited[idx] {
                    continue;
                }
                visited[idx] = true;

                let distance = seed.manhattan(&next);
                if distance > radius || grid.zone(next) != ZoneType::Empty {
                    continue;
                }
                if rng.gen_bool(self.claim_probability(distance)) {
                    grid.set_zone(next, zone);
                    frontier.push_back(next);
                }
            }
        }
    }

    fn claim_probability(&self, distance: usize) -> f64 {
        (1.0 - self.config.growth_decay * distance as f64)
            .clamp(self.config.min_claim_probability, 1.0)
    }
}

/// Pick an empty seed cell, preferring the interior away from the edges
fn pick_seed<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Option<Cell> {
    let size = grid.size();
    let (lo, hi) = if size > 2 * SEED_MARGIN {
        (SEED_MARGIN, size - 1 - SEED_MARGIN)
    } else {
        (0, size - 1)
    };

    for _ in 0..SEED_ATTEMPTS {
        let cell = Cell::new(rng.gen_range(lo..=hi), rng.gen_range(lo..=hi));
        if grid.zone(cell) == ZoneType::Empty {
            return Some(cell);
        }
    }

    let empty: Vec<Cell> = grid
        .cells()
        .filter(|cell| grid.zone(*cell) == ZoneType::Empty)
        .collect();
    empty.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_zone_type_present_on_15x15() {
        let clusterer = ZoneClusterer::default();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = clusterer.generate(15, &mut rng).unwrap();
            assert_eq!(grid.cell_count(), 225);
            for zone in ZoneType::DEVELOPED {
                assert!(grid.count(zone) > 0, "seed {seed}: no {zone} cells");
            }
            assert!(grid.count(ZoneType::Empty) > 0, "seed {seed}: no empty cells");
        }
    }

    #[test]
    fn test_same_seed_same_map() {
        let clusterer = ZoneClusterer::default();
        let a = clusterer
            .generate(20, &mut StdRng::seed_from_u64(7))
            .unwrap();
        let b = clusterer
            .generate(20, &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tiny_grids() {
        let clusterer = ZoneClusterer::default();
        let mut rng = StdRng::seed_from_u64(1);
        let single = clusterer.generate(1, &mut rng).unwrap();
        assert_eq!(single.cell_count(), 1);
        assert_ne!(single.zone(Cell::new(0, 0)), ZoneType::Empty);

        let small = clusterer.generate(3, &mut rng).unwrap();
        assert_eq!(small.cell_count(), 9);
        assert!(clusterer.generate(0, &mut rng).is_err());
    }

    #[test]
    fn test_claim_probability_decays_to_floor() {
        let clusterer = ZoneClusterer::default();
        assert_eq!(clusterer.claim_probability(0), 1.0);
        assert!((clusterer.claim_probability(2) - 0.6).abs() < 1e-12);
        assert_eq!(clusterer.claim_probability(10), 0.1);
    }

    #[test]
    fn test_rejects_inverted_cluster_bounds() {
        let config = ZoningConfig {
            clusters_min: 5,
            clusters_max: 2,
            ..Default::default()
        };
        assert!(ZoneClusterer::new(config).is_err());
    }
}
