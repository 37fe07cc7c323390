//! Capacity sharing between facilities.
//!
//! A cell can be served by any facility whose radius reaches it, and a
//! facility can split its capacity over any cells it reaches. The credited
//! coverage of a facility set is the maximum flow in the bipartite network
//!
//! ```text
//! source --capacity--> facility --(in range)--> cell --demand--> sink
//! ```
//!
//! which is exactly the optimum of the placement MIP once the sites are fixed.
//! Both the optimizer and the coverage evaluator go through [`allocate`], so
//! they agree on coverage to the last bit.

use std::collections::{BTreeMap, VecDeque};

use crate::domain::{Cell, DemandMatrix};

/// Residuals at or below this are treated as exhausted
pub const FLOW_EPSILON: f64 = 1e-9;

/// Outcome of sharing facility capacity over the demand of one scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Total credited demand in MW
    pub covered_mw: f64,
    /// Credited demand per cell, row-major
    pub covered: Vec<f64>,
    /// Number of facilities reaching each cell, row-major
    pub reach_count: Vec<usize>,
    /// Load per facility, in row-major site order
    pub facility_load_mw: Vec<f64>,
}

impl Allocation {
    fn empty(size: usize, facilities: usize) -> Self {
        Self {
            covered_mw: 0.0,
            covered: vec![0.0; size * size],
            reach_count: vec![0; size * size],
            facility_load_mw: vec![0.0; facilities],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Parent {
    Source,
    /// Reached a cell over the `pos`-th edge of facility `site`
    Forward { site: usize, pos: usize },
    /// Reached a facility by undoing its flow into `cell` (edge `pos`)
    Backward { cell: usize, pos: usize },
}

/// Bipartite facility/cell network with flows on the facility→cell edges
struct FlowNetwork {
    /// Local cell ids reached by each facility, ascending
    site_cells: Vec<Vec<usize>>,
    /// `(facility, edge position)` pairs feeding each local cell
    cell_sites: Vec<Vec<(usize, usize)>>,
    flow: Vec<Vec<f64>>,
    site_residual: Vec<f64>,
    cell_demand: Vec<f64>,
    cell_inflow: Vec<f64>,
}

impl FlowNetwork {
    fn cell_residual(&self, cell: usize) -> f64 {
        self.cell_demand[cell] - self.cell_inflow[cell]
    }

    /// Breadth-first search for a shortest augmenting path. Returns the
    /// parent table and the sink-side cell, if any path exists.
    fn find_path(&self) -> Option<(Vec<Option<Parent>>, usize)> {
        let sites = self.site_cells.len();
        let mut site_parent: Vec<Option<Parent>> = vec![None; sites];
        let mut cell_parent: Vec<Option<Parent>> = vec![None; self.cell_demand.len()];
        let mut queue = VecDeque::new();

        for site in 0..sites {
            if self.site_residual[site] > FLOW_EPSILON {
                site_parent[site] = Some(Parent::Source);
                queue.push_back(Node::Site(site));
            }
        }

        while let Some(node) = queue.pop_front() {
            match node {
                Node::Site(site) => {
                    for (pos, &cell) in self.site_cells[site].iter().enumerate() {
                        if cell_parent[cell].is_some() {
                            continue;
                        }
                        cell_parent[cell] = Some(Parent::Forward { site, pos });
                        if self.cell_residual(cell) > FLOW_EPSILON {
                            let mut parents = site_parent;
                            parents.extend(cell_parent);
                            return Some((parents, cell));
                        }
                        queue.push_back(Node::Cell(cell));
                    }
                }
                Node::Cell(cell) => {
                    for &(site, pos) in &self.cell_sites[cell] {
                        if site_parent[site].is_none() && self.flow[site][pos] > FLOW_EPSILON {
                            site_parent[site] = Some(Parent::Backward { cell, pos });
                            queue.push_back(Node::Site(site));
                        }
                    }
                }
            }
        }
        None
    }

    /// Push as much flow as the path allows. Parents are indexed facilities
    /// first, then cells.
    fn augment(&mut self, parents: &[Option<Parent>], sink: usize) {
        let sites = self.site_cells.len();
        let cell_parent = |cell: usize| parents[sites + cell];

        let mut bottleneck = self.cell_residual(sink);
        let mut cell = sink;
        loop {
            let Some(Parent::Forward { site, .. }) = cell_parent(cell) else {
                unreachable!("cell on an augmenting path is entered by a forward edge");
            };
            match parents[site] {
                Some(Parent::Source) => {
                    bottleneck = bottleneck.min(self.site_residual[site]);
                    break;
                }
                Some(Parent::Backward { cell: prev, pos }) => {
                    bottleneck = bottleneck.min(self.flow[site][pos]);
                    cell = prev;
                }
                _ => unreachable!("facility on an augmenting path has a parent"),
            }
        }

        self.cell_inflow[sink] += bottleneck;
        let mut cell = sink;
        loop {
            let Some(Parent::Forward { site, pos }) = cell_parent(cell) else {
                unreachable!("cell on an augmenting path is entered by a forward edge");
            };
            self.flow[site][pos] += bottleneck;
            match parents[site] {
                Some(Parent::Source) => {
                    self.site_residual[site] = (self.site_residual[site] - bottleneck).max(0.0);
                    break;
                }
                Some(Parent::Backward { cell: prev, pos }) => {
                    self.flow[site][pos] = (self.flow[site][pos] - bottleneck).max(0.0);
                    cell = prev;
                }
                _ => unreachable!("facility on an augmenting path has a parent"),
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Site(usize),
    Cell(usize),
}

/// Share `capacity_mw` per facility over the demand reachable within `radius`.
///
/// Sites are processed in row-major order whatever order they are given in,
/// so the result depends only on the set of sites. Repeated sites count as
/// separate facilities.
pub fn allocate(
    demand: &DemandMatrix,
    sites: &[Cell],
    radius: f64,
    capacity_mw: f64,
) -> Allocation {
    let size = demand.size();
    let mut sites = sites.to_vec();
    sites.sort();

    let mut allocation = Allocation::empty(size, sites.len());
    for site in &sites {
        for cell in site.neighborhood(radius, size) {
            allocation.reach_count[cell.row * size + cell.col] += 1;
        }
    }
    if sites.is_empty() || !(radius > 0.0) || !(capacity_mw > 0.0) {
        return allocation;
    }

    // Local ids follow row-major cell order
    let mut local: BTreeMap<Cell, usize> = BTreeMap::new();
    let reached: Vec<Vec<Cell>> = sites
        .iter()
        .map(|site| {
            site.neighborhood(radius, size)
                .into_iter()
                .filter(|cell| demand.get(*cell) > 0.0)
                .collect()
        })
        .collect();
    for cell in reached.iter().flatten() {
        local.insert(*cell, 0);
    }
    let cells: Vec<Cell> = local.keys().copied().collect();
    for (id, slot) in local.values_mut().enumerate() {
        *slot = id;
    }

    let mut network = FlowNetwork {
        site_cells: Vec::with_capacity(sites.len()),
        cell_sites: vec![Vec::new(); cells.len()],
        flow: Vec::with_capacity(sites.len()),
        site_residual: vec![capacity_mw; sites.len()],
        cell_demand: cells.iter().map(|cell| demand.get(*cell)).collect(),
        cell_inflow: vec![0.0; cells.len()],
    };
    for (site, reached) in reached.iter().enumerate() {
        let ids: Vec<usize> = reached.iter().map(|cell| local[cell]).collect();
        for (pos, id) in ids.iter().enumerate() {
            network.cell_sites[*id].push((site, pos));
        }
        network.flow.push(vec![0.0; ids.len()]);
        network.site_cells.push(ids);
    }

    while let Some((parents, sink)) = network.find_path() {
        network.augment(&parents, sink);
    }

    for (id, cell) in cells.iter().enumerate() {
        allocation.covered[cell.row * size + cell.col] =
            network.cell_inflow[id].min(network.cell_demand[id]);
    }
    allocation.covered_mw = allocation.covered.iter().sum();
    allocation.facility_load_mw = network.flow.iter().map(|f| f.iter().sum()).collect();
    allocation
}
