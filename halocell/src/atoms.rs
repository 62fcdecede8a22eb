//! Fixed-slot structure-of-arrays storage for atom data

use aligned_box::AlignedBox;
use anyhow::{anyhow, Result};

use crate::cells::CellGrid;

// 32 byte alignment is enough for AVX2 and older
const ALIGNMENT: usize = 32;

/// Per-rank atom storage
///
/// Every cell owns a fixed run of `cell_capacity` slots; the slot of atom `n`
/// in `cell` is `cell * cell_capacity + n`. Slots are not stable: removal
/// compacts a cell by swapping its last atom into the freed slot.
pub struct AtomStore {
    cell_capacity: usize,
    my_cell_num: usize,
    /// Occupied slots per cell
    atom_count: Vec<usize>,
    /// Atoms resident in interior cells of this rank
    my_num: usize,
    /// Sum of `my_num` over all ranks, refreshed by the exchange cycle
    total_num: usize,
    pos: AlignedBox<[f64]>,
    momenta: AlignedBox<[f64]>,
    force: AlignedBox<[f64]>,
    pot: AlignedBox<[f64]>,
    id: AlignedBox<[i64]>,
}

impl AtomStore {
    pub(crate) fn new(cells: &CellGrid, cell_capacity: usize) -> Result<Self> {
        let slots = cells.total_cell_num() * cell_capacity;
        let alloc_f64 = |n: usize| {
            AlignedBox::slice_from_value(ALIGNMENT, n, 0.0f64)
                .map_err(|e| anyhow!("Cannot allocate atom data: {}", e))
        };
        Ok(Self {
            cell_capacity,
            my_cell_num: cells.my_cell_num(),
            atom_count: vec![0; cells.total_cell_num()],
            my_num: 0,
            total_num: 0,
            pos: alloc_f64(3 * slots)?,
            momenta: alloc_f64(3 * slots)?,
            force: alloc_f64(3 * slots)?,
            pot: alloc_f64(slots)?,
            id: AlignedBox::slice_from_value(ALIGNMENT, slots, 0i64)
                .map_err(|e| anyhow!("Cannot allocate atom ids: {}", e))?,
        })
    }

    fn slot(&self, cell: usize, n: usize) -> usize {
        debug_assert!(n < self.cell_capacity);
        cell * self.cell_capacity + n
    }

    /// Fixed atom capacity of a single cell
    pub fn cell_capacity(&self) -> usize {
        self.cell_capacity
    }

    /// Number of atoms resident in `cell`
    pub fn count(&self, cell: usize) -> usize {
        self.atom_count[cell]
    }

    /// Number of atoms owned by this rank
    pub fn my_num(&self) -> usize {
        self.my_num
    }

    /// Global atom count as of the last exchange cycle
    pub fn total_num(&self) -> usize {
        self.total_num
    }

    pub(crate) fn set_total_num(&mut self, total: usize) {
        self.total_num = total;
    }

    pub fn id(&self, cell: usize, n: usize) -> i64 {
        self.id[self.slot(cell, n)]
    }

    pub fn position(&self, cell: usize, n: usize) -> [f64; 3] {
        let s = 3 * self.slot(cell, n);
        [self.pos[s], self.pos[s + 1], self.pos[s + 2]]
    }

    pub fn momentum(&self, cell: usize, n: usize) -> [f64; 3] {
        let s = 3 * self.slot(cell, n);
        [self.momenta[s], self.momenta[s + 1], self.momenta[s + 2]]
    }

    pub fn force(&self, cell: usize, n: usize) -> [f64; 3] {
        let s = 3 * self.slot(cell, n);
        [self.force[s], self.force[s + 1], self.force[s + 2]]
    }

    pub fn potential(&self, cell: usize, n: usize) -> f64 {
        self.pot[self.slot(cell, n)]
    }

    /// Mutable view of an atom's position (for the integrator)
    pub fn position_mut(&mut self, cell: usize, n: usize) -> &mut [f64] {
        let s = 3 * self.slot(cell, n);
        &mut self.pos[s..s + 3]
    }

    /// Mutable view of an atom's momentum (for the integrator)
    pub fn momentum_mut(&mut self, cell: usize, n: usize) -> &mut [f64] {
        let s = 3 * self.slot(cell, n);
        &mut self.momenta[s..s + 3]
    }

    /// Mutable view of an atom's force (for force evaluation)
    pub fn force_mut(&mut self, cell: usize, n: usize) -> &mut [f64] {
        let s = 3 * self.slot(cell, n);
        &mut self.force[s..s + 3]
    }

    pub fn potential_mut(&mut self, cell: usize, n: usize) -> &mut f64 {
        let s = self.slot(cell, n);
        &mut self.pot[s]
    }

    /// Append an atom to `cell`
    ///
    /// A full cell is a fatal condition: there is no growth path, the slot
    /// pitch is baked into the storage and buffer layout.
    pub(crate) fn insert(
        &mut self,
        cell: usize,
        id: i64,
        pos: [f64; 3],
        momenta: [f64; 3],
    ) -> Result<()> {
        let n = self.atom_count[cell];
        if n == self.cell_capacity {
            return Err(anyhow!(
                "Cell {} is full (capacity {}), cannot place atom {}",
                cell, self.cell_capacity, id));
        }
        let s = self.slot(cell, n);
        for i in 0..3 {
            self.pos[3 * s + i] = pos[i];
            self.momenta[3 * s + i] = momenta[i];
        }
        self.id[s] = id;
        self.atom_count[cell] += 1;
        if cell < self.my_cell_num {
            self.my_num += 1;
        }
        Ok(())
    }

    /// Move the atom at `(cell1, n)` into the next free slot of `cell2`
    ///
    /// The vacated slot is backfilled with `cell1`'s last atom, so the caller
    /// must re-examine slot `n` afterwards. Crossing the interior/halo
    /// boundary in either direction adjusts the ownership count; the cell
    /// index exactly equal to the interior cell count already lies in the
    /// halo and counts as having left ownership.
    pub(crate) fn relocate(&mut self, cell1: usize, n: usize, cell2: usize) -> Result<()> {
        let n2 = self.atom_count[cell2];
        if n2 == self.cell_capacity {
            return Err(anyhow!(
                "Cell {} is full (capacity {}), cannot move atom {} from cell {}",
                cell2, self.cell_capacity, self.id(cell1, n), cell1));
        }
        self.copy_slot(self.slot(cell1, n), self.slot(cell2, n2));
        self.atom_count[cell2] += 1;
        self.atom_count[cell1] -= 1;
        // Swap-compaction: fill the freed slot from the end of the cell
        if self.atom_count[cell1] > n {
            self.copy_slot(
                self.slot(cell1, self.atom_count[cell1]),
                self.slot(cell1, n),
            );
        }
        match (cell1 < self.my_cell_num, cell2 < self.my_cell_num) {
            (true, false) => self.my_num -= 1,
            (false, true) => self.my_num += 1,
            _ => {}
        }
        Ok(())
    }

    fn copy_slot(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        for i in 0..3 {
            self.pos[3 * to + i] = self.pos[3 * from + i];
            self.momenta[3 * to + i] = self.momenta[3 * from + i];
            self.force[3 * to + i] = self.force[3 * from + i];
        }
        self.pot[to] = self.pot[from];
        self.id[to] = self.id[from];
    }

    /// Empty every halo cell; their contents are rebuilt each exchange cycle
    pub(crate) fn clear_halo(&mut self) {
        for count in self.atom_count[self.my_cell_num..].iter_mut() {
            *count = 0;
        }
    }
}
