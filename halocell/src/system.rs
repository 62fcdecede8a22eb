//! Per-rank system state and the rank-group driver

use anyhow::{anyhow, Result};

use crate::atoms::AtomStore;
use crate::cells::CellGrid;
use crate::comm::exchange::run_exchange;
use crate::comm::{CommTopology, HaloComm};
use crate::domain::{Decomposition, SpatialDomain};
use crate::migrate;

/// Everything one rank owns: its sub-box, cell grid, atoms and topology
///
/// All mutation of cells and atoms is local to the owning rank; neighbor
/// effects only ever arrive as data copies through the exchange windows.
pub struct LocalSystem {
    domain: SpatialDomain,
    cells: CellGrid,
    topology: CommTopology,
    atoms: AtomStore,
}

impl LocalSystem {
    pub fn new(layout: &Decomposition, rank: usize) -> Result<Self> {
        layout.validate()?;
        let domain = SpatialDomain::new(layout, rank)?;
        let cells = CellGrid::new(&domain, layout.cutoff)?;
        let topology = CommTopology::new(layout, &domain, &cells);
        let atoms = AtomStore::new(&cells, layout.cell_capacity)?;
        Ok(Self {
            domain,
            cells,
            topology,
            atoms,
        })
    }

    pub fn domain(&self) -> &SpatialDomain {
        &self.domain
    }

    pub fn cells(&self) -> &CellGrid {
        &self.cells
    }

    pub fn topology(&self) -> &CommTopology {
        &self.topology
    }

    pub fn atoms(&self) -> &AtomStore {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut AtomStore {
        &mut self.atoms
    }

    /// Place a new atom by position
    ///
    /// Used to seed the initial configuration, and by any collaborator that
    /// must inject atoms later.
    pub fn create_atom(&mut self, id: i64, pos: [f64; 3], momenta: [f64; 3]) -> Result<()> {
        migrate::assign_atom(&self.domain, &self.cells, &mut self.atoms, id, pos, momenta)
    }

    /// Recompute cell residency for every owned atom
    ///
    /// Clears the halo ring first; movers that left the interior end up
    /// parked in halo cells until the next exchange delivers them.
    pub fn migrate(&mut self) -> Result<()> {
        migrate::migrate(&self.domain, &self.cells, &mut self.atoms)
    }

    /// One full cycle: migration, three-axis halo exchange, count refresh
    ///
    /// Must be called after any step that may have moved an atom across a
    /// cell boundary, and before force evaluation reads halo data. The
    /// refreshed global count is only valid between cycles, never mid-cycle.
    pub fn migrate_and_exchange(&mut self, comm: &HaloComm) -> Result<()> {
        self.migrate()?;
        run_exchange(
            &self.domain,
            &self.cells,
            &self.topology,
            &mut self.atoms,
            comm,
        )?;
        let total = comm
            .collective()
            .all_sum_count(self.domain.rank(), self.atoms.my_num());
        self.atoms.set_total_num(total);
        Ok(())
    }

    /// Global atom count as of the last completed cycle
    pub fn total_atom_count(&self) -> usize {
        self.atoms.total_num()
    }
}

/// Spawn one worker thread per rank and run `f` on each rank's system
///
/// Results are collected in rank order. The closure must drive every
/// collective operation (exchange cycles, reductions) the same number of
/// times on every rank; a rank that returns early while its peers sit in a
/// fence stalls the group, which is the visible failure mode of a
/// desynchronized run.
pub fn run_group<F, T>(layout: &Decomposition, f: F) -> Result<Vec<T>>
where
    F: Fn(&mut LocalSystem, &HaloComm) -> Result<T> + Sync,
    T: Send,
{
    let comm = HaloComm::new(layout)?;
    let results = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = (0..layout.num_ranks())
            .map(|rank| {
                let comm = &comm;
                let f = &f;
                scope.spawn(move |_| -> Result<T> {
                    let mut system = LocalSystem::new(layout, rank)?;
                    f(&mut system, comm)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("Cannot join rank thread"))
            .collect::<Vec<_>>()
    })
    .map_err(|_| anyhow!("Rank group panicked"))?;
    results.into_iter().collect()
}
