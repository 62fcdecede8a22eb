//! Static communication topology: neighbor ranks and boundary cell lists

use strum::IntoEnumIterator;

use crate::cells::{CellGrid, Direction};
use crate::domain::{Decomposition, SpatialDomain};

/// Per-direction neighbor ranks and boundary cell classification
///
/// Computed once from the decomposition and never mutated. For every
/// direction there are two cell lists:
///
/// - *migration-boundary* cells: the two-cell-thick slab on that face of the
///   halo-extended box, minus the ghost-source cells. Their contents are
///   handed to the neighbor during the migration phase of the exchange. The
///   slab deliberately includes inner-layer cells whose other coordinates lie
///   in the halo ring; forwarding those is what carries edge and corner
///   atoms to diagonal neighbors across the sequential axis passes.
/// - *ghost-source* cells: the innermost interior layer on that face, whose
///   atoms are replicated to the neighbor as read-only ghosts.
pub struct CommTopology {
    neighbor: [usize; 6],
    migration_cells: [Vec<usize>; 6],
    ghost_cells: [Vec<usize>; 6],
}

impl CommTopology {
    pub(crate) fn new(
        layout: &Decomposition,
        domain: &SpatialDomain,
        cells: &CellGrid,
    ) -> Self {
        let mut neighbor = [0usize; 6];
        let mut migration_cells: [Vec<usize>; 6] = Default::default();
        let mut ghost_cells: [Vec<usize>; 6] = Default::default();

        for dir in Direction::iter() {
            let axis = dir.axis();
            // Wraparound neighbor; with one rank on the axis this is ourselves
            let mut position = domain.position();
            let extent = layout.grid[axis];
            position[axis] = if dir.is_positive() {
                (position[axis] + 1) % extent
            } else {
                (position[axis] + extent - 1) % extent
            };
            neighbor[dir.index()] = layout.rank_at(position);

            // Walk the two-cell slab on this face of the halo-extended box
            let dims = cells.dims();
            let mut begin = [-1isize; 3];
            let mut end = [dims[0] as isize + 1, dims[1] as isize + 1, dims[2] as isize + 1];
            if dir.is_positive() {
                begin[axis] = end[axis] - 2;
            } else {
                end[axis] = begin[axis] + 2;
            }
            let (migration, ghost) =
                (&mut migration_cells[dir.index()], &mut ghost_cells[dir.index()]);
            for x in begin[0]..end[0] {
                for y in begin[1]..end[1] {
                    for z in begin[2]..end[2] {
                        let coords = [x, y, z];
                        let cell = cells.cell_at(coords)
                            .expect("slab coordinate inside the extended box");
                        if cells.is_ghost_source(coords) {
                            ghost.push(cell);
                        } else {
                            migration.push(cell);
                        }
                    }
                }
            }
        }

        Self {
            neighbor,
            migration_cells,
            ghost_cells,
        }
    }

    /// Rank of the neighbor in `dir`
    pub fn neighbor(&self, dir: Direction) -> usize {
        self.neighbor[dir.index()]
    }

    /// Migration-boundary cells of `dir`, in fixed scan order
    pub fn migration_cells(&self, dir: Direction) -> &[usize] {
        &self.migration_cells[dir.index()]
    }

    /// Ghost-source cells of `dir`, in fixed scan order
    pub fn ghost_cells(&self, dir: Direction) -> &[usize] {
        &self.ghost_cells[dir.index()]
    }

    /// Record capacity required for the ghost region (all six directions)
    pub(crate) fn ghost_region_capacity(&self, cell_capacity: usize) -> usize {
        let cells: usize = Direction::iter()
            .map(|dir| self.ghost_cells(dir).len())
            .sum();
        cells * cell_capacity
    }

    /// Record capacity required for the migration region (worst axis pair)
    pub(crate) fn migration_region_capacity(&self, cell_capacity: usize) -> usize {
        let cells = (0..3)
            .map(|axis| {
                self.migration_cells(Direction::from_axis(axis, false)).len()
                    + self.migration_cells(Direction::from_axis(axis, true)).len()
            })
            .max()
            .expect("three axes");
        cells * cell_capacity
    }
}
