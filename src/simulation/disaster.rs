//! # Disaster Impact Model
//!
//! Turns a baseline demand matrix into a post-disaster matrix. Every kind
//! builds a per-cell multiplier map with values in `[0, 1]`, so a disaster can
//! only remove demand, and the footprint grows with severity.
//!
//! | Kind        | Footprint                               | Reduction                      |
//! |-------------|-----------------------------------------|--------------------------------|
//! | Earthquake  | disc of radius `1.5 × severity`         | 100% at epicenter → 0% at edge |
//! | Flood       | full-length band, `severity` cells wide | 70% inside                     |
//! | PowerOutage | rectangle of `10 × severity` cells      | 90% inside                     |
//! | Storm       | 1-3 discs of radius ≤ `1.2 × severity`  | 80% at centre → 0% at edge     |
//!
//! All geometry is drawn from the caller's random source.

use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, info};
use validator::Validate;

use crate::domain::{cells_of, Cell, DemandMatrix};
use crate::error::{Result, SitingError};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DisasterKind {
    Earthquake,
    Flood,
    PowerOutage,
    Storm,
}

/// Disaster severity on a 1-10 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(SitingError::invalid(format!(
                "severity must be in {}..={}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1..=2 => "Minor",
            3..=5 => "Moderate",
            6..=7 => "Severe",
            8..=9 => "Major",
            _ => "Catastrophic",
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = SitingError;

    fn try_from(value: u8) -> Result<Self> {
        Severity::new(value)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasterSpec {
    pub kind: DisasterKind,
    pub severity: Severity,
}

impl DisasterSpec {
    pub fn new(kind: DisasterKind, severity: u8) -> Result<Self> {
        Ok(Self {
            kind,
            severity: Severity::new(severity)?,
        })
    }

    /// Human-readable summary, e.g. "Severe Earthquake"
    pub fn description(&self) -> String {
        let kind = match self.kind {
            DisasterKind::Earthquake => "Earthquake",
            DisasterKind::Flood => "Flood",
            DisasterKind::PowerOutage => "Power Outage",
            DisasterKind::Storm => "Storm",
        };
        format!("{} {kind}", self.severity.label())
    }
}

/// Tunable shape constants for every disaster kind
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DisasterShape {
    /// Earthquake radius per severity unit, in cells
    #[validate(range(min = 0.0))]
    pub earthquake_radius_per_severity: f64,
    /// Reduction at the epicenter (1.0 = all demand lost)
    #[validate(range(min = 0.0, max = 1.0))]
    pub earthquake_peak_reduction: f64,
    /// Flood band width per severity unit, in cells
    #[validate(range(min = 0.0))]
    pub flood_width_per_severity: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub flood_reduction: f64,
    /// Outage rectangle area per severity unit, in cells
    #[validate(range(min = 0.0))]
    pub outage_area_per_severity: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub outage_reduction: f64,
    /// Upper bound on each storm cell's radius per severity unit
    #[validate(range(min = 0.0))]
    pub storm_radius_per_severity: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub storm_peak_reduction: f64,
    /// Exponential recovery rate toward baseline demand, per hour
    #[validate(range(min = 0.0))]
    pub recovery_rate_per_hour: f64,
}

impl Default for DisasterShape {
    fn default() -> Self {
        Self {
            earthquake_radius_per_severity: 1.5,
            earthquake_peak_reduction: 1.0,
            flood_width_per_severity: 1.0,
            flood_reduction: 0.7,
            outage_area_per_severity: 10.0,
            outage_reduction: 0.9,
            storm_radius_per_severity: 1.2,
            storm_peak_reduction: 0.8,
            recovery_rate_per_hour: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Band spans whole rows
    Horizontal,
    /// Band spans whole columns
    Vertical,
}

/// Where a disaster struck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisasterFootprint {
    Earthquake {
        epicenter: Cell,
        radius: f64,
    },
    Flood {
        orientation: Orientation,
        /// First affected row/column
        start: usize,
        /// One past the last affected row/column
        end: usize,
    },
    PowerOutage {
        top_left: Cell,
        rows: usize,
        cols: usize,
    },
    Storm {
        /// `(center, radius)` of each storm cell
        cells: Vec<(Cell, f64)>,
    },
}

/// Result of applying a disaster to a demand matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterImpact {
    pub spec: DisasterSpec,
    pub footprint: DisasterFootprint,
    /// Row-major demand multipliers, each in `[0, 1]`
    pub multipliers: Vec<f64>,
    pub demand: DemandMatrix,
    /// Cells whose demand was reduced
    pub affected_cells: usize,
    /// Drop in total demand relative to the baseline, in percent
    pub reduction_pct: f64,
}

impl DisasterImpact {
    /// Demand after `hours` of recovery: every multiplier closes
    /// `1 - e^(-rate * hours)` of its gap to 1.0. Zero hours gives the
    /// post-disaster matrix back; the result never exceeds `baseline`.
    ///
    /// # Panics
    /// If `baseline` is not the matrix this impact was computed from in shape.
    pub fn recovered(
        &self,
        baseline: &DemandMatrix,
        hours: f64,
        rate_per_hour: f64,
    ) -> DemandMatrix {
        let size = baseline.size();
        assert_eq!(
            self.multipliers.len(),
            size * size,
            "baseline must match the {size}x{size} impact footprint"
        );
        let progress = if hours > 0.0 && rate_per_hour > 0.0 {
            (1.0 - (-rate_per_hour * hours).exp()).clamp(0.0, 1.0)
        } else {
            0.0
        };
        DemandMatrix::from_fn(size, |cell| {
            let multiplier = self.multipliers[cell.row * size + cell.col];
            let recovered = (multiplier + (1.0 - multiplier) * progress).clamp(0.0, 1.0);
            baseline.get(cell) * recovered
        })
    }
}

/// Applies disaster transforms to demand matrices
#[derive(Debug, Clone, Default)]
pub struct DisasterModel {
    shape: DisasterShape,
}

impl DisasterModel {
    pub fn new(shape: DisasterShape) -> Result<Self> {
        shape.validate()?;
        Ok(Self { shape })
    }

    pub fn shape(&self) -> &DisasterShape {
        &self.shape
    }

    /// Single post-recovery snapshot at the configured recovery rate
    pub fn recover(
        &self,
        impact: &DisasterImpact,
        baseline: &DemandMatrix,
        hours: f64,
    ) -> DemandMatrix {
        let recovered = impact.recovered(baseline, hours, self.shape.recovery_rate_per_hour);
        debug!(
            hours,
            disaster_mw = impact.demand.total(),
            recovered_mw = recovered.total(),
            "recovery applied"
        );
        recovered
    }

    /// Post-disaster demand; the input matrix is left untouched
    pub fn apply<R: Rng + ?Sized>(
        &self,
        spec: &DisasterSpec,
        demand: &DemandMatrix,
        rng: &mut R,
    ) -> DemandMatrix {
        self.simulate(spec, demand, rng).demand
    }

    /// Post-disaster demand together with the footprint and impact figures
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        spec: &DisasterSpec,
        demand: &DemandMatrix,
        rng: &mut R,
    ) -> DisasterImpact {
        let size = demand.size();
        let severity = spec.severity.as_f64();

        let (footprint, multipliers) = match spec.kind {
            DisasterKind::Earthquake => self.earthquake(size, severity, rng),
            DisasterKind::Flood => self.flood(size, severity, rng),
            DisasterKind::PowerOutage => self.power_outage(size, severity, rng),
            DisasterKind::Storm => self.storm(size, severity, rng),
        };

        let after = DemandMatrix::from_fn(size, |cell| {
            demand.get(cell) * multipliers[cell.row * size + cell.col]
        });
        let before_total = demand.total();
        let reduction_pct = if before_total > 0.0 {
            (1.0 - after.total() / before_total) * 100.0
        } else {
            0.0
        };
        let affected_cells = multipliers.iter().filter(|m| **m < 1.0).count();

        info!(
            disaster = %spec.description(),
            affected_cells,
            reduction_pct,
            "disaster applied"
        );

        DisasterImpact {
            spec: *spec,
            footprint,
            multipliers,
            demand: after,
            affected_cells,
            reduction_pct,
        }
    }

    fn earthquake<R: Rng + ?Sized>(
        &self,
        size: usize,
        severity: f64,
        rng: &mut R,
    ) -> (DisasterFootprint, Vec<f64>) {
        // Epicenter lands in the central half of the grid
        let lo = size / 4;
        let hi = (3 * size / 4).clamp(lo, size.saturating_sub(1));
        let epicenter = Cell::new(rng.gen_range(lo..=hi), rng.gen_range(lo..=hi));
        let radius = self.shape.earthquake_radius_per_severity * severity;

        let mut multipliers = vec![1.0; size * size];
        apply_radial(
            &mut multipliers,
            size,
            epicenter,
            radius,
            self.shape.earthquake_peak_reduction,
        );
        (DisasterFootprint::Earthquake { epicenter, radius }, multipliers)
    }

    fn flood<R: Rng + ?Sized>(
        &self,
        size: usize,
        severity: f64,
        rng: &mut R,
    ) -> (DisasterFootprint, Vec<f64>) {
        let orientation = if rng.gen_bool(0.5) {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let center = rng.gen_range(0..size);
        let width = ((self.shape.flood_width_per_severity * severity).round() as usize).max(1);
        let start = center.saturating_sub(width / 2);
        let end = (start + width).min(size);

        let keep = 1.0 - self.shape.flood_reduction;
        let multipliers = cells_of(size)
            .map(|cell| {
                let line = match orientation {
                    Orientation::Horizontal => cell.row,
                    Orientation::Vertical => cell.col,
                };
                if (start..end).contains(&line) {
                    keep
                } else {
                    1.0
                }
            })
            .collect();
        (
            DisasterFootprint::Flood {
                orientation,
                start,
                end,
            },
            multipliers,
        )
    }

    fn power_outage<R: Rng + ?Sized>(
        &self,
        size: usize,
        severity: f64,
        rng: &mut R,
    ) -> (DisasterFootprint, Vec<f64>) {
        let area = ((self.shape.outage_area_per_severity * severity).round() as usize).max(1);
        let rows = ((area as f64).sqrt().ceil() as usize).clamp(1, size);
        let cols = area.div_ceil(rows).clamp(1, size);
        let top_left = Cell::new(
            rng.gen_range(0..=size - rows),
            rng.gen_range(0..=size - cols),
        );

        let keep = 1.0 - self.shape.outage_reduction;
        let multipliers = cells_of(size)
            .map(|cell| {
                let inside = (top_left.row..top_left.row + rows).contains(&cell.row)
                    && (top_left.col..top_left.col + cols).contains(&cell.col);
                if inside {
                    keep
                } else {
                    1.0
                }
            })
            .collect();
        (
            DisasterFootprint::PowerOutage {
                top_left,
                rows,
                cols,
            },
            multipliers,
        )
    }

    fn storm<R: Rng + ?Sized>(
        &self,
        size: usize,
        severity: f64,
        rng: &mut R,
    ) -> (DisasterFootprint, Vec<f64>) {
        let max_radius = self.shape.storm_radius_per_severity * severity;
        let count = rng.gen_range(1..=3);
        let mut multipliers = vec![1.0; size * size];
        let mut cells = Vec::with_capacity(count);

        for _ in 0..count {
            let center = Cell::new(rng.gen_range(0..size), rng.gen_range(0..size));
            let radius = max_radius * rng.gen_range(0.5..=1.0);
            apply_radial(
                &mut multipliers,
                size,
                center,
                radius,
                self.shape.storm_peak_reduction,
            );
            cells.push((center, radius));
        }
        (DisasterFootprint::Storm { cells }, multipliers)
    }
}

/// Multiply in a reduction that falls linearly from `peak_reduction` at
/// `center` to zero at `radius`. Multipliers stay within `[0, 1]`.
fn apply_radial(
    multipliers: &mut [f64],
    size: usize,
    center: Cell,
    radius: f64,
    peak_reduction: f64,
) {
    if !(radius > 0.0) {
        return;
    }
    for cell in center.neighborhood(radius, size) {
        let reduction = peak_reduction * (1.0 - center.distance(&cell) / radius);
        multipliers[cell.row * size + cell.col] *= (1.0 - reduction).clamp(0.0, 1.0);
    }
}
