//! The six-directional halo exchange

use anyhow::Result;
use strum::IntoEnumIterator;

use crate::atoms::AtomStore;
use crate::cells::{CellGrid, Direction};
use crate::domain::{Decomposition, SpatialDomain};
use crate::migrate::assign_atom;

use super::collective::Collective;
use super::topology::CommTopology;
use super::window::{AtomRecord, GhostRegion, MigrationRegion, Window};

/// Shared communication state of one rank group
///
/// Two windows and a collective, created once per run. The ghost window is
/// packed once per cycle with the boundary replicas for all six directions;
/// the migration window is repacked for every axis.
pub struct HaloComm {
    ghost: Window<GhostRegion>,
    migration: Window<MigrationRegion>,
    collective: Collective,
}

impl HaloComm {
    /// Build the windows for every rank of the decomposition
    ///
    /// Region capacities are fixed here from the maximum possible boundary
    /// cell population; running past them later is a configuration error,
    /// not a recoverable condition.
    pub fn new(layout: &Decomposition) -> Result<Self> {
        layout.validate()?;
        let mut ghost_regions = Vec::with_capacity(layout.num_ranks());
        let mut migration_regions = Vec::with_capacity(layout.num_ranks());
        for rank in 0..layout.num_ranks() {
            let domain = SpatialDomain::new(layout, rank)?;
            let cells = CellGrid::new(&domain, layout.cutoff)?;
            let topology = CommTopology::new(layout, &domain, &cells);
            ghost_regions.push(GhostRegion::new(
                topology.ghost_region_capacity(layout.cell_capacity)));
            migration_regions.push(MigrationRegion::new(
                topology.migration_region_capacity(layout.cell_capacity)));
        }
        Ok(Self {
            ghost: Window::new(ghost_regions),
            migration: Window::new(migration_regions),
            collective: Collective::new(layout.num_ranks()),
        })
    }

    pub fn collective(&self) -> &Collective {
        &self.collective
    }
}

fn record(atoms: &AtomStore, cell: usize, n: usize) -> AtomRecord {
    AtomRecord {
        id: atoms.id(cell, n),
        pos: atoms.position(cell, n),
        momenta: atoms.momentum(cell, n),
    }
}

/// Place one received record, applying the periodic shift of the receive face
fn assign_record(
    domain: &SpatialDomain,
    cells: &CellGrid,
    atoms: &mut AtomStore,
    rec: &AtomRecord,
    shift: [f64; 3],
) -> Result<()> {
    let pos = [
        rec.pos[0] + shift[0],
        rec.pos[1] + shift[1],
        rec.pos[2] + shift[2],
    ];
    assign_atom(domain, cells, atoms, rec.id, pos, rec.momenta)
}

/// Run one full exchange cycle for this rank
///
/// Precondition: migration has already parked every atom that left the
/// interior in the matching halo cell. One iteration per axis; the fences
/// are collective and issued unconditionally, so all ranks must run the same
/// number of iterations regardless of how much they have to send.
pub(crate) fn run_exchange(
    domain: &SpatialDomain,
    cells: &CellGrid,
    topology: &CommTopology,
    atoms: &mut AtomStore,
    comm: &HaloComm,
) -> Result<()> {
    let rank = domain.rank();

    // Pack the ghost replicas for all six directions up front; the per-axis
    // loop only ever reads this region
    {
        let mut region = comm.ghost.own(rank);
        let mut n = 0;
        for dir in Direction::iter() {
            for &cell in topology.ghost_cells(dir) {
                for k in 0..atoms.count(cell) {
                    region.write(n, record(atoms, cell, k))?;
                    n += 1;
                }
            }
            region.set_offset(dir, n);
        }
    }

    for axis in 0..3 {
        let negative = Direction::from_axis(axis, false);
        let positive = Direction::from_axis(axis, true);

        // Pack the atoms leaving through this axis' pair of faces
        {
            let mut region = comm.migration.own(rank);
            let mut n = 0;
            for &cell in topology.migration_cells(negative) {
                for k in 0..atoms.count(cell) {
                    region.write(n, record(atoms, cell, k))?;
                    n += 1;
                }
            }
            let negative_count = n;
            for &cell in topology.migration_cells(positive) {
                for k in 0..atoms.count(cell) {
                    region.write(n, record(atoms, cell, k))?;
                    n += 1;
                }
            }
            region.set_counts(negative_count, n - negative_count);
        }
        // Publish: writes complete, reads may begin
        comm.migration.fence();

        // Pull the ghost slices facing us from both neighbors. The slice
        // bounds come from the neighbor's own cumulative header.
        {
            let region = comm.ghost.peer(topology.neighbor(negative));
            let shift = domain.receive_shift(negative);
            for rec in region.slice(positive) {
                assign_record(domain, cells, atoms, rec, shift)?;
            }
        }
        {
            let region = comm.ghost.peer(topology.neighbor(positive));
            let shift = domain.receive_shift(positive);
            for rec in region.slice(negative) {
                assign_record(domain, cells, atoms, rec, shift)?;
            }
        }
        comm.ghost.fence();

        // Pull the atoms that left the neighbors toward us: the positive
        // block of the negative neighbor and the negative block of the
        // positive neighbor
        {
            let region = comm.migration.peer(topology.neighbor(negative));
            let shift = domain.receive_shift(negative);
            for rec in region.leaving_positive() {
                assign_record(domain, cells, atoms, rec, shift)?;
            }
        }
        {
            let region = comm.migration.peer(topology.neighbor(positive));
            let shift = domain.receive_shift(positive);
            for rec in region.leaving_negative() {
                assign_record(domain, cells, atoms, rec, shift)?;
            }
        }
        // Close the epoch before the next axis reuses the migration region
        comm.migration.fence();
    }

    Ok(())
}
