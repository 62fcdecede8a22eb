//! Atom-to-cell assignment and the per-step migration pass

use anyhow::Result;

use crate::atoms::AtomStore;
use crate::cells::CellGrid;
use crate::domain::SpatialDomain;

/// Place an atom in the cell covering its position
///
/// Shared by initial seeding, migration and exchange unpacking; the target
/// may be a halo cell, in which case the atom is not counted as owned.
pub(crate) fn assign_atom(
    domain: &SpatialDomain,
    cells: &CellGrid,
    atoms: &mut AtomStore,
    id: i64,
    pos: [f64; 3],
    momenta: [f64; 3],
) -> Result<()> {
    let cell = cells.cell_for_position(domain, &pos)?;
    atoms.insert(cell, id, pos, momenta)
}

/// Recompute the home cell of every owned atom and relocate the movers
///
/// The scan position is not advanced after a relocation: compaction moves a
/// different atom into the freed slot, which must be examined in turn. Every
/// atom is therefore classified exactly once, and no cell is ever left in an
/// inconsistent state mid-scan.
pub(crate) fn migrate(
    domain: &SpatialDomain,
    cells: &CellGrid,
    atoms: &mut AtomStore,
) -> Result<()> {
    atoms.clear_halo();
    for cell in 0..cells.my_cell_num() {
        let mut n = 0;
        while n < atoms.count(cell) {
            let target = cells.cell_for_position(domain, &atoms.position(cell, n))?;
            if target == cell {
                n += 1;
                continue;
            }
            atoms.relocate(cell, n, target)?;
        }
    }
    Ok(())
}
