use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::{cells_of, Cell, Grid, ZoneType};

/// Per-cell demand in MW over a square grid.
///
/// Values are finite and non-negative and the grid has at least one cell.
/// Constructors panic otherwise: a NaN, negative or empty demand map is a bug
/// upstream, not an input to recover from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DemandMatrix {
    pub fn zeros(size: usize) -> Self {
        check_size(size);
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Build from row-major values
    pub fn from_values(size: usize, values: Vec<f64>) -> Self {
        check_size(size);
        assert_eq!(
            values.len(),
            size * size,
            "demand matrix for a {size}x{size} grid needs {} values",
            size * size
        );
        for (idx, value) in values.iter().enumerate() {
            check_demand(*value, idx, size);
        }
        Self { size, values }
    }

    /// Build by evaluating `f` on every cell in row-major order
    pub fn from_fn(size: usize, f: impl FnMut(Cell) -> f64) -> Self {
        Self::from_values(size, cells_of(size).map(f).collect())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, cell: Cell) -> f64 {
        self.values[cell.row * self.size + cell.col]
    }

    /// Row-major values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Values as rows, for heat-map rendering
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.values.chunks(self.size.max(1)).map(<[_]>::to_vec).collect()
    }

    /// Sum of all cells, accumulated in row-major order
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// New matrix with `f(cell, demand)` applied to every cell
    pub fn map(&self, mut f: impl FnMut(Cell, f64) -> f64) -> Self {
        Self::from_fn(self.size, |cell| f(cell, self.get(cell)))
    }

    /// Per-cell `self - other`, the disaster impact differential when `self` is
    /// the normal matrix. Entries are not clamped.
    pub fn difference(&self, other: &DemandMatrix) -> Vec<Vec<f64>> {
        assert_eq!(self.size, other.size, "demand matrices differ in size");
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a - b)
            .collect::<Vec<_>>()
            .chunks(self.size.max(1))
            .map(<[_]>::to_vec)
            .collect()
    }

    /// Demand aggregated by zone type
    pub fn zone_statistics(&self, grid: &Grid) -> Vec<ZoneStatistics> {
        assert_eq!(self.size, grid.size(), "grid and demand sizes differ");
        ZoneType::iter()
            .map(|zone| {
                let demands: Vec<f64> = grid
                    .cells()
                    .filter(|cell| grid.zone(*cell) == zone)
                    .map(|cell| self.get(cell))
                    .collect();
                ZoneStatistics::from_demands(zone, &demands)
            })
            .collect()
    }
}

fn check_size(size: usize) {
    assert!(size > 0, "demand matrix needs a grid of at least one cell");
}

fn check_demand(value: f64, idx: usize, size: usize) {
    assert!(
        value.is_finite() && value >= 0.0,
        "demand at ({}, {}) must be finite and non-negative, got {value}",
        idx / size.max(1),
        idx % size.max(1)
    );
}

/// Aggregate demand for one zone type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatistics {
    pub zone: ZoneType,
    pub cell_count: usize,
    pub total_mw: f64,
    pub average_mw: f64,
    pub max_mw: f64,
}

impl ZoneStatistics {
    fn from_demands(zone: ZoneType, demands: &[f64]) -> Self {
        let total_mw: f64 = demands.iter().sum();
        let average_mw = if demands.is_empty() {
            0.0
        } else {
            total_mw / demands.len() as f64
        };
        Self {
            zone,
            cell_count: demands.len(),
            total_mw,
            average_mw,
            max_mw: demands.iter().copied().fold(0.0, f64::max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_and_rows() {
        let demand = DemandMatrix::from_values(2, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(demand.total(), 10.0);
        assert_eq!(demand.max(), 4.0);
        assert_eq!(demand.rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(demand.get(Cell::new(1, 0)), 3.0);
    }

    #[test]
    #[should_panic(expected = "finite and non-negative")]
    fn test_negative_demand_panics() {
        DemandMatrix::from_values(1, vec![-0.1]);
    }

    #[test]
    #[should_panic(expected = "finite and non-negative")]
    fn test_nan_demand_panics() {
        DemandMatrix::from_values(2, vec![1.0, f64::NAN, 0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "at least one cell")]
    fn test_empty_matrix_panics() {
        DemandMatrix::zeros(0);
    }

    #[test]
    #[should_panic(expected = "at least one cell")]
    fn test_empty_values_panic() {
        DemandMatrix::from_values(0, Vec::new());
    }

    #[test]
    fn test_map_leaves_input_untouched() {
        let demand = DemandMatrix::from_values(2, vec![2.0, 2.0, 2.0, 2.0]);
        let halved = demand.map(|_, d| d * 0.5);
        assert_eq!(demand.total(), 8.0);
        assert_eq!(halved.total(), 4.0);
        assert_eq!(
            demand.difference(&halved),
            vec![vec![1.0, 1.0], vec![1.0, 1.0]]
        );
    }

    #[test]
    fn test_zone_statistics() {
        let grid = Grid::from_zones(
            2,
            vec![
                ZoneType::Residential,
                ZoneType::Residential,
                ZoneType::Industrial,
                ZoneType::Empty,
            ],
        )
        .unwrap();
        let demand = DemandMatrix::from_values(2, vec![3.0, 5.0, 10.0, 0.5]);
        let stats = demand.zone_statistics(&grid);

        let residential = stats
            .iter()
            .find(|s| s.zone == ZoneType::Residential)
            .unwrap();
        assert_eq!(residential.cell_count, 2);
        assert_eq!(residential.total_mw, 8.0);
        assert_eq!(residential.average_mw, 4.0);
        assert_eq!(residential.max_mw, 5.0);

        let commercial = stats
            .iter()
            .find(|s| s.zone == ZoneType::Commercial)
            .unwrap();
        assert_eq!(commercial.cell_count, 0);
        assert_eq!(commercial.average_mw, 0.0);
    }
}
