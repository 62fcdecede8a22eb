//! Single-rank behavior of the cell store and the migration pass:
//! swap-compaction, capacity limits, idempotence and the ownership boundary

use halocell::{Decomposition, LocalSystem};

const EXTENT: [f64; 3] = [8.0, 6.0, 6.0];
const CUTOFF: f64 = 2.0;

fn layout(cell_capacity: usize) -> Decomposition {
    Decomposition {
        grid: [1, 1, 1],
        origin: [0.0, 0.0, 0.0],
        extent: EXTENT,
        cutoff: CUTOFF,
        cell_capacity,
    }
}

fn cell_of(system: &LocalSystem, pos: [f64; 3]) -> usize {
    system
        .cells()
        .cell_for_position(system.domain(), &pos)
        .unwrap()
}

#[test]
fn compaction_moves_the_last_atom_into_the_freed_slot() {
    let mut system = LocalSystem::new(&layout(8), 0).unwrap();
    // Three atoms in the same cell
    system.create_atom(1, [0.3, 0.3, 0.3], [0.0; 3]).unwrap();
    system.create_atom(2, [0.6, 0.6, 0.6], [0.0; 3]).unwrap();
    system.create_atom(3, [0.9, 0.9, 0.9], [0.0; 3]).unwrap();
    let cell = cell_of(&system, [0.3, 0.3, 0.3]);
    assert_eq!(system.atoms().count(cell), 3);
    assert_eq!(
        (0..3).map(|n| system.atoms().id(cell, n)).collect::<Vec<_>>(),
        vec![1, 2, 3]);

    // Send the atom in slot 1 to a different cell
    system.atoms_mut().position_mut(cell, 1)[0] += 2.0;
    system.migrate().unwrap();

    let target = cell_of(&system, [2.6, 0.6, 0.6]);
    assert_ne!(target, cell);
    assert_eq!(system.atoms().count(cell), 2);
    assert_eq!(system.atoms().count(target), 1);
    // Slot 0 untouched, former slot 2 compacted down into slot 1
    assert_eq!(system.atoms().id(cell, 0), 1);
    assert_eq!(system.atoms().position(cell, 0), [0.3, 0.3, 0.3]);
    assert_eq!(system.atoms().id(cell, 1), 3);
    assert_eq!(system.atoms().position(cell, 1), [0.9, 0.9, 0.9]);
    assert_eq!(system.atoms().id(target, 0), 2);
}

#[test]
fn a_full_cell_rejects_further_atoms() {
    let mut system = LocalSystem::new(&layout(2), 0).unwrap();
    system.create_atom(1, [0.3, 0.3, 0.3], [0.0; 3]).unwrap();
    system.create_atom(2, [0.6, 0.6, 0.6], [0.0; 3]).unwrap();
    let result = system.create_atom(3, [0.9, 0.9, 0.9], [0.0; 3]);
    assert!(result.is_err());
    assert_eq!(system.atoms().my_num(), 2);
}

#[test]
fn migration_without_movement_is_a_no_op() {
    let mut system = LocalSystem::new(&layout(8), 0).unwrap();
    let positions = [
        [0.5, 0.5, 0.5],
        [1.5, 0.7, 0.9],
        [3.3, 3.3, 3.3],
        [7.9, 5.9, 5.9],
        [4.1, 2.2, 1.3],
    ];
    for (n, pos) in positions.iter().enumerate() {
        system.create_atom(n as i64, *pos, [0.0; 3]).unwrap();
    }
    let snapshot = |system: &LocalSystem| {
        let mut atoms = vec![];
        for cell in 0..system.cells().my_cell_num() {
            for n in 0..system.atoms().count(cell) {
                atoms.push((cell, n, system.atoms().id(cell, n), system.atoms().position(cell, n)));
            }
        }
        atoms
    };
    let before = snapshot(&system);
    system.migrate().unwrap();
    assert_eq!(snapshot(&system), before);
    system.migrate().unwrap();
    assert_eq!(snapshot(&system), before);
    assert_eq!(system.atoms().my_num(), positions.len());
}

#[test]
fn leaving_the_interior_drops_ownership() {
    let mut system = LocalSystem::new(&layout(8), 0).unwrap();
    // Last interior cell along +x
    system.create_atom(42, [7.7, 3.0, 3.0], [1.0, 0.0, 0.0]).unwrap();
    assert_eq!(system.atoms().my_num(), 1);

    // One integrator step pushes it past my_max
    let cell = cell_of(&system, [7.7, 3.0, 3.0]);
    system.atoms_mut().position_mut(cell, 0)[0] += 0.5;
    system.migrate().unwrap();

    assert_eq!(system.atoms().my_num(), 0);
    let halo = cell_of(&system, [8.2, 3.0, 3.0]);
    assert!(!system.cells().is_interior(halo));
    assert_eq!(system.cells().coords(halo), [4, 1, 1]);
    assert_eq!(system.atoms().count(halo), 1);
    assert_eq!(system.atoms().id(halo, 0), 42);
}

#[test]
fn the_first_halo_cell_counts_as_left_ownership() {
    let mut system = LocalSystem::new(&layout(8), 0).unwrap();
    let first_halo = system.cells().cell_at([-1, -1, -1]).unwrap();
    // The halo enumeration starts right after the interior cells
    assert_eq!(first_halo, system.cells().my_cell_num());

    system.create_atom(7, [0.4, 0.4, 0.4], [0.0; 3]).unwrap();
    let cell = cell_of(&system, [0.4, 0.4, 0.4]);
    for axis in 0..3 {
        system.atoms_mut().position_mut(cell, 0)[axis] -= 0.9;
    }
    system.migrate().unwrap();

    assert_eq!(system.atoms().count(first_halo), 1);
    assert_eq!(system.atoms().my_num(), 0);
}
