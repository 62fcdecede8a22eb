//! Periodic wraparound on a single rank
//!
//! With one rank per axis every face neighbor is the rank itself, so the
//! exchange replicates the box's own boundary atoms back into the halo ring
//! with wrapped coordinates. This prints the resulting ghost ring for a
//! handful of atoms placed near the faces.

use anyhow::Result;

use halocell::{run_group, Decomposition};

fn main() -> Result<()> {
    let layout = Decomposition {
        grid: [1, 1, 1],
        origin: [0.0; 3],
        extent: [6.0, 6.0, 6.0],
        cutoff: 2.0,
        cell_capacity: 8,
    };

    run_group(&layout, |system, comm| -> Result<()> {
        // One atom deep inside, three near faces and one in a corner cell
        system.create_atom(0, [3.0, 3.0, 3.0], [0.0; 3])?;
        system.create_atom(1, [5.5, 3.0, 3.0], [0.0; 3])?;
        system.create_atom(2, [3.0, 0.5, 3.0], [0.0; 3])?;
        system.create_atom(3, [3.0, 3.0, 5.5], [0.0; 3])?;
        system.create_atom(4, [5.5, 5.5, 5.5], [0.0; 3])?;

        system.migrate_and_exchange(comm)?;

        println!("Owned atoms: {}", system.atoms().my_num());
        println!("Ghost ring:");
        for cell in system.cells().my_cell_num()..system.cells().total_cell_num() {
            for n in 0..system.atoms().count(cell) {
                println!(
                    "  cell {:?}  id {}  position {:?}",
                    system.cells().coords(cell),
                    system.atoms().id(cell, n),
                    system.atoms().position(cell, n));
            }
        }
        Ok(())
    })?;

    Ok(())
}
