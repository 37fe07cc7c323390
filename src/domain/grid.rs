use itertools::iproduct;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{Result, SitingError};

/// A grid cell identified by `(row, col)`.
///
/// Ordering is row-major, which every deterministic sweep over cells relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Squared Euclidean distance in cells
    pub fn distance_squared(&self, other: &Cell) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        dr * dr + dc * dc
    }

    pub fn distance(&self, other: &Cell) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn manhattan(&self, other: &Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Coverage reach rule shared by the optimizer and the evaluator.
    ///
    /// Euclidean distance, inclusive boundary. A non-positive (or NaN) radius
    /// reaches nothing, not even the facility's own cell.
    pub fn within_radius(&self, other: &Cell, radius: f64) -> bool {
        radius > 0.0 && self.distance_squared(other) <= radius * radius
    }

    /// All cells of a `size × size` grid within `radius` of this cell, row-major.
    pub fn neighborhood(&self, radius: f64, size: usize) -> Vec<Cell> {
        if !(radius > 0.0) || size == 0 {
            return Vec::new();
        }
        let reach = radius.floor().min(size as f64) as usize;
        let rows = self.row.saturating_sub(reach)..=(self.row + reach).min(size - 1);
        let cols = self.col.saturating_sub(reach)..=(self.col + reach).min(size - 1);
        iproduct!(rows, cols)
            .map(|(row, col)| Cell::new(row, col))
            .filter(|cell| self.within_radius(cell, radius))
            .collect()
    }
}

/// Land-use classification of a cell
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoneType {
    #[default]
    Empty,
    Residential,
    Commercial,
    Industrial,
}

impl ZoneType {
    /// Zones that clustering actively seeds; everything else stays `Empty`.
    pub const DEVELOPED: [ZoneType; 3] = [
        ZoneType::Residential,
        ZoneType::Commercial,
        ZoneType::Industrial,
    ];

    /// Base demand in MW per cell before time, season and noise factors
    pub fn base_demand_mw(&self) -> f64 {
        match self {
            ZoneType::Empty => 0.5,
            ZoneType::Residential => 3.0,
            ZoneType::Commercial => 6.0,
            ZoneType::Industrial => 10.0,
        }
    }
}

/// Square zone map. Dimensions are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    zones: Vec<ZoneType>,
}

impl Grid {
    /// All-empty grid
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(SitingError::invalid("grid size must be greater than zero"));
        }
        Ok(Self {
            size,
            zones: vec![ZoneType::Empty; size * size],
        })
    }

    /// Build a grid from row-major zone assignments
    pub fn from_zones(size: usize, zones: Vec<ZoneType>) -> Result<Self> {
        if size == 0 {
            return Err(SitingError::invalid("grid size must be greater than zero"));
        }
        if zones.len() != size * size {
            return Err(SitingError::invalid(format!(
                "expected {} zone entries for a {size}x{size} grid, got {}",
                size * size,
                zones.len()
            )));
        }
        Ok(Self { size, zones })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.zones.len()
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        cell.row < self.size && cell.col < self.size
    }

    pub fn zone(&self, cell: Cell) -> ZoneType {
        self.zones[self.index(cell)]
    }

    pub(crate) fn set_zone(&mut self, cell: Cell, zone: ZoneType) {
        let idx = self.index(cell);
        self.zones[idx] = zone;
    }

    /// Row-major zone assignments
    pub fn zones(&self) -> &[ZoneType] {
        &self.zones
    }

    /// Zone map as rows, for zone-map rendering
    pub fn rows(&self) -> Vec<Vec<ZoneType>> {
        self.zones.chunks(self.size).map(<[_]>::to_vec).collect()
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        cells_of(self.size)
    }

    pub fn count(&self, zone: ZoneType) -> usize {
        self.zones.iter().filter(|z| **z == zone).count()
    }

    /// 4-connected neighbours inside the grid
    pub fn neighbors4(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        let offsets: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        offsets.into_iter().filter_map(move |(dr, dc)| {
            let row = cell.row.checked_add_signed(dr)?;
            let col = cell.col.checked_add_signed(dc)?;
            let next = Cell::new(row, col);
            self.contains(&next).then_some(next)
        })
    }

    #[inline]
    fn index(&self, cell: Cell) -> usize {
        debug_assert!(self.contains(&cell), "cell {cell:?} outside {0}x{0} grid", self.size);
        cell.row * self.size + cell.col
    }
}

/// Row-major cells of a `size × size` grid
pub fn cells_of(size: usize) -> impl Iterator<Item = Cell> {
    iproduct!(0..size, 0..size).map(|(row, col)| Cell::new(row, col))
}
