//! # Demand Generation
//!
//! Baseline per-cell demand: the zone's base rate scaled by an hour-of-day
//! curve, a seasonal multiplier and bounded Gaussian noise drawn from the
//! caller's random source.
//!
//! At 08:00 in spring both factors are exactly 1.0, so with noise disabled
//! every cell carries its zone's base rate.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

use crate::domain::{DemandMatrix, Grid, ZoneType};
use crate::error::{Result, SitingError};

/// Hour-of-day demand multipliers, index = hour
pub const HOURLY_FACTORS: [f64; 24] = [
    0.6, 0.5, 0.4, 0.4, 0.4, 0.5, // 00-05
    0.7, 0.9, 1.0, 1.1, 1.2, 1.3, // 06-11
    1.4, 1.3, 1.2, 1.1, 1.0, 1.1, // 12-17
    1.3, 1.4, 1.3, 1.1, 0.9, 0.7, // 18-23
];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Seasonal demand multiplier (cooling in summer, heating in winter)
    pub fn factor(&self) -> f64 {
        match self {
            Season::Spring => 1.0,
            Season::Summer => 1.3,
            Season::Fall => 1.1,
            Season::Winter => 1.2,
        }
    }

    /// Northern-hemisphere meteorological season of a date
    pub fn from_date(date: NaiveDate) -> Self {
        match date.month() {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }
}

/// Snapshot conditions a demand matrix is generated for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandConditions {
    /// Hour of day, 0-23
    pub hour: u32,
    pub season: Season,
}

impl DemandConditions {
    pub fn new(hour: u32, season: Season) -> Result<Self> {
        if hour > 23 {
            return Err(SitingError::invalid(format!(
                "hour of day must be in 0..=23, got {hour}"
            )));
        }
        Ok(Self { hour, season })
    }

    /// Conditions under which both time and season factors are 1.0
    pub fn reference() -> Self {
        Self {
            hour: 8,
            season: Season::Spring,
        }
    }

    pub fn at(timestamp: NaiveDateTime) -> Self {
        Self {
            hour: timestamp.hour(),
            season: Season::from_date(timestamp.date()),
        }
    }

    pub fn time_factor(&self) -> f64 {
        HOURLY_FACTORS[(self.hour % 24) as usize]
    }
}

impl Default for DemandConditions {
    fn default() -> Self {
        Self::reference()
    }
}

/// Zone-specific daily shape layered on top of the shared hourly curve
struct ZonePattern {
    peak_hours: &'static [u32],
    low_hours: &'static [u32],
    multiplier: f64,
}

fn zone_pattern(zone: ZoneType) -> Option<ZonePattern> {
    match zone {
        ZoneType::Residential => Some(ZonePattern {
            peak_hours: &[7, 8, 18, 19, 20],
            low_hours: &[2, 3, 4, 5],
            multiplier: 1.0,
        }),
        ZoneType::Commercial => Some(ZonePattern {
            peak_hours: &[9, 10, 11, 12, 13, 14, 15, 16],
            low_hours: &[22, 23, 0, 1, 2, 3, 4, 5, 6],
            multiplier: 1.2,
        }),
        ZoneType::Industrial => Some(ZonePattern {
            peak_hours: &[8, 9, 10, 11, 12, 13, 14, 15, 16, 17],
            low_hours: &[0, 1, 2, 3, 4, 5, 6],
            multiplier: 0.8,
        }),
        ZoneType::Empty => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DemandGeneratorConfig {
    /// Standard deviation of the relative noise term
    #[validate(range(min = 0.0, max = 1.0))]
    pub noise_std_dev: f64,
    /// Noise is clamped to `[-noise_limit, noise_limit]`
    #[validate(range(min = 0.0, max = 1.0))]
    pub noise_limit: f64,
    /// Apply zone-specific peak/low hour shaping
    pub zone_patterns: bool,
}

impl Default for DemandGeneratorConfig {
    fn default() -> Self {
        Self {
            noise_std_dev: 0.1,
            noise_limit: 0.2,
            zone_patterns: false,
        }
    }
}

/// Computes baseline demand matrices from a zone map
#[derive(Debug, Clone)]
pub struct DemandGenerator {
    config: DemandGeneratorConfig,
    /// `None` when noise is disabled
    noise: Option<Normal<f64>>,
}

impl DemandGenerator {
    pub fn new(config: DemandGeneratorConfig) -> Result<Self> {
        config.validate()?;
        let noise = if config.noise_std_dev > 0.0 {
            let normal = Normal::new(0.0, config.noise_std_dev)
                .map_err(|e| SitingError::invalid(format!("noise distribution: {e}")))?;
            Some(normal)
        } else {
            None
        };
        Ok(Self { config, noise })
    }

    /// Generator without random variation
    pub fn noiseless() -> Self {
        Self {
            config: DemandGeneratorConfig {
                noise_std_dev: 0.0,
                noise_limit: 0.0,
                zone_patterns: false,
            },
            noise: None,
        }
    }

    pub fn with_zone_patterns(mut self, enabled: bool) -> Self {
        self.config.zone_patterns = enabled;
        self
    }

    pub fn config(&self) -> &DemandGeneratorConfig {
        &self.config
    }

    /// Deterministic part of a cell's demand multiplier
    pub fn factor(&self, zone: ZoneType, conditions: &DemandConditions) -> f64 {
        let mut factor = conditions.time_factor() * conditions.season.factor();
        if self.config.zone_patterns {
            if let Some(pattern) = zone_pattern(zone) {
                let shape = if pattern.peak_hours.contains(&conditions.hour) {
                    1.2
                } else if pattern.low_hours.contains(&conditions.hour) {
                    0.6
                } else {
                    1.0
                };
                factor *= pattern.multiplier * shape;
            }
        }
        factor
    }

    /// Generate the baseline ("normal") demand matrix for `grid`.
    ///
    /// One noise draw per cell, row-major, so the same RNG state always yields
    /// the same matrix.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        grid: &Grid,
        conditions: &DemandConditions,
        rng: &mut R,
    ) -> DemandMatrix {
        DemandMatrix::from_fn(grid.size(), |cell| {
            let zone = grid.zone(cell);
            let noise = self.sample_noise(rng);
            // noise_limit <= 1 keeps the product non-negative
            zone.base_demand_mw() * self.factor(zone, conditions) * (1.0 + noise)
        })
    }

    fn sample_noise<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.noise {
            Some(normal) => normal
                .sample(rng)
                .clamp(-self.config.noise_limit, self.config.noise_limit),
            None => 0.0,
        }
    }
}

impl Default for DemandGenerator {
    fn default() -> Self {
        let config = DemandGeneratorConfig::default();
        Self {
            noise: Normal::new(0.0, config.noise_std_dev).ok(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Cell;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixture_grid() -> Grid {
        Grid::from_zones(
            2,
            vec![
                ZoneType::Empty,
                ZoneType::Residential,
                ZoneType::Commercial,
                ZoneType::Industrial,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_reference_conditions_give_exact_base_rates() {
        let grid = fixture_grid();
        let generator = DemandGenerator::noiseless();
        let mut rng = StdRng::seed_from_u64(3);
        let demand = generator.generate(&grid, &DemandConditions::reference(), &mut rng);

        assert_eq!(demand.get(Cell::new(0, 0)), 0.5);
        assert_eq!(demand.get(Cell::new(0, 1)), 3.0);
        assert_eq!(demand.get(Cell::new(1, 0)), 6.0);
        assert_eq!(demand.get(Cell::new(1, 1)), 10.0);
    }

    #[test]
    fn test_time_and_season_scale_demand() {
        let grid = fixture_grid();
        let generator = DemandGenerator::noiseless();
        let mut rng = StdRng::seed_from_u64(3);
        let summer_noon = DemandConditions::new(12, Season::Summer).unwrap();
        let demand = generator.generate(&grid, &summer_noon, &mut rng);

        let expected = 10.0 * 1.4 * 1.3;
        assert!((demand.get(Cell::new(1, 1)) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_noise_is_bounded() {
        let grid = Grid::from_zones(10, vec![ZoneType::Commercial; 100]).unwrap();
        let generator = DemandGenerator::new(DemandGeneratorConfig {
            noise_std_dev: 0.5,
            noise_limit: 0.2,
            zone_patterns: false,
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let demand = generator.generate(&grid, &DemandConditions::reference(), &mut rng);

        for value in demand.values() {
            assert!(*value >= 6.0 * 0.8 - 1e-12 && *value <= 6.0 * 1.2 + 1e-12);
        }
        assert!(demand.values().iter().any(|v| (*v - 6.0).abs() > 1e-9));
    }

    #[test]
    fn test_full_noise_band_stays_non_negative() {
        let grid = Grid::from_zones(12, vec![ZoneType::Industrial; 144]).unwrap();
        let generator = DemandGenerator::new(DemandGeneratorConfig {
            noise_std_dev: 1.0,
            noise_limit: 1.0,
            zone_patterns: false,
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let demand = generator.generate(&grid, &DemandConditions::reference(), &mut rng);

        assert!(demand.values().iter().all(|v| (0.0..=20.0).contains(v)));
        // Wide noise hits the lower clamp somewhere on the grid
        assert!(demand.values().iter().any(|v| *v == 0.0));
    }

    #[test]
    fn test_zone_patterns() {
        let generator = DemandGenerator::noiseless().with_zone_patterns(true);
        let noon = DemandConditions::new(12, Season::Spring).unwrap();
        // Commercial peak: 1.4 (hour) * 1.2 (zone) * 1.2 (peak)
        let expected = 1.4 * 1.2 * 1.2;
        assert!((generator.factor(ZoneType::Commercial, &noon) - expected).abs() < 1e-12);
        assert_eq!(generator.factor(ZoneType::Empty, &noon), 1.4);
    }

    #[test]
    fn test_season_from_date() {
        let date = |m| NaiveDate::from_ymd_opt(2024, m, 15).unwrap();
        assert_eq!(Season::from_date(date(1)), Season::Winter);
        assert_eq!(Season::from_date(date(4)), Season::Spring);
        assert_eq!(Season::from_date(date(7)), Season::Summer);
        assert_eq!(Season::from_date(date(10)), Season::Fall);
        assert_eq!(Season::from_date(date(12)), Season::Winter);
    }

    #[test]
    fn test_conditions_validation() {
        assert!(DemandConditions::new(24, Season::Spring).is_err());
        let ts = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        let conditions = DemandConditions::at(ts);
        assert_eq!(conditions.hour, 19);
        assert_eq!(conditions.season, Season::Summer);
        assert_eq!(conditions.time_factor(), 1.4);
    }

    #[test]
    fn test_invalid_noise_config_rejected() {
        let config = DemandGeneratorConfig {
            noise_std_dev: -1.0,
            ..Default::default()
        };
        assert!(DemandGenerator::new(config).is_err());
    }
}
