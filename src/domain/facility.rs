use serde::{Deserialize, Serialize};

use super::Cell;

/// A placed facility with the run-wide radius and capacity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub site: Cell,
    /// Coverage radius in cells (Euclidean)
    pub radius: f64,
    /// Upper bound on demand credited to this facility, in MW
    pub capacity_mw: f64,
}

impl Facility {
    pub fn reaches(&self, cell: &Cell) -> bool {
        self.site.within_radius(cell, self.radius)
    }
}

/// Selected sites plus the parameters all facilities of a run share.
///
/// This is the facility-list view handed to renderers for drawing coverage
/// circles. Sites are kept in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilitySet {
    sites: Vec<Cell>,
    pub radius: f64,
    pub capacity_mw: f64,
}

impl FacilitySet {
    pub fn new(mut sites: Vec<Cell>, radius: f64, capacity_mw: f64) -> Self {
        sites.sort();
        Self {
            sites,
            radius,
            capacity_mw,
        }
    }

    pub fn empty(radius: f64, capacity_mw: f64) -> Self {
        Self::new(Vec::new(), radius, capacity_mw)
    }

    pub fn sites(&self) -> &[Cell] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn facilities(&self) -> impl Iterator<Item = Facility> + '_ {
        self.sites.iter().map(|site| Facility {
            site: *site,
            radius: self.radius,
            capacity_mw: self.capacity_mw,
        })
    }

    /// Nameplate capacity of the whole set
    pub fn total_capacity_mw(&self) -> f64 {
        self.sites.len() as f64 * self.capacity_mw
    }

    /// Number of facilities whose radius reaches `cell`
    pub fn reach_count(&self, cell: &Cell) -> usize {
        self.facilities().filter(|f| f.reaches(cell)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_sorted_and_capacity() {
        let set = FacilitySet::new(vec![Cell::new(4, 1), Cell::new(0, 3)], 2.0, 12.0);
        assert_eq!(set.sites(), &[Cell::new(0, 3), Cell::new(4, 1)]);
        assert_eq!(set.total_capacity_mw(), 24.0);
        assert_eq!(set.facilities().count(), 2);
    }

    #[test]
    fn test_reach_count() {
        let set = FacilitySet::new(vec![Cell::new(0, 0), Cell::new(0, 2)], 1.5, 5.0);
        assert_eq!(set.reach_count(&Cell::new(0, 1)), 2);
        assert_eq!(set.reach_count(&Cell::new(1, 0)), 1);
        assert_eq!(set.reach_count(&Cell::new(3, 3)), 0);
        assert!(FacilitySet::empty(1.0, 1.0).is_empty());
    }
}
