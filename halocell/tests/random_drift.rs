//! Drive a randomized ballistic drift across a 2x2x2 rank grid and check
//! that ownership is conserved and the store invariants hold on every step

use anyhow::Result;
use halocell::{run_group, Decomposition, LocalSystem};
use rand::SeedableRng;
use rand_distr::Distribution;

const ATOMS_PER_RANK: usize = 32;
const NUM_STEPS: usize = 15;
const RNG_SEED: u64 = 987654321;
const DT: f64 = 0.5;

fn layout() -> Decomposition {
    Decomposition {
        grid: [2, 2, 2],
        origin: [0.0; 3],
        extent: [16.0, 12.0, 12.0],
        cutoff: 2.0,
        cell_capacity: 32,
    }
}

/// Check the store invariants a consistent system must satisfy
fn verify_store(system: &LocalSystem) {
    let capacity = system.atoms().cell_capacity();
    let mut owned = 0;
    for cell in 0..system.cells().total_cell_num() {
        let count = system.atoms().count(cell);
        assert!(count <= capacity);
        if system.cells().is_interior(cell) {
            owned += count;
            // Every owned atom must reside in the cell covering its position
            for n in 0..count {
                let pos = system.atoms().position(cell, n);
                let home = system
                    .cells()
                    .cell_for_position(system.domain(), &pos)
                    .unwrap();
                assert_eq!(home, cell);
            }
        }
    }
    assert_eq!(owned, system.atoms().my_num());
}

#[test]
fn drifting_atoms_are_never_lost_or_duplicated() {
    let layout = layout();
    let num_ranks = layout.num_ranks();

    let ids = run_group(&layout, |system, comm| -> Result<Vec<i64>> {
        let rank = system.domain().rank();
        let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(RNG_SEED + rank as u64);
        // Momenta small enough that no atom can cross a full cell per step
        let momentum = rand_distr::Uniform::new(-1.5, 1.5);
        let lo = system.domain().my_min();
        let hi = system.domain().my_max();
        for i in 0..ATOMS_PER_RANK {
            let mut pos = [0.0; 3];
            for axis in 0..3 {
                let inside = rand_distr::Uniform::new(lo[axis] + 0.01, hi[axis] - 0.01);
                pos[axis] = inside.sample(&mut rng);
            }
            let momenta = [
                momentum.sample(&mut rng),
                momentum.sample(&mut rng),
                momentum.sample(&mut rng),
            ];
            system.create_atom((rank * ATOMS_PER_RANK + i) as i64, pos, momenta)?;
        }

        for _ in 0..NUM_STEPS {
            // Ballistic drift of all owned atoms
            for cell in 0..system.cells().my_cell_num() {
                for n in 0..system.atoms().count(cell) {
                    let momenta = system.atoms().momentum(cell, n);
                    let pos = system.atoms_mut().position_mut(cell, n);
                    for axis in 0..3 {
                        pos[axis] += momenta[axis] * DT;
                    }
                }
            }
            system.migrate_and_exchange(comm)?;
            verify_store(system);
            assert_eq!(system.total_atom_count(), num_ranks * ATOMS_PER_RANK);
        }

        // Hand the owned ids back for the global uniqueness check
        let mut ids = vec![];
        for cell in 0..system.cells().my_cell_num() {
            for n in 0..system.atoms().count(cell) {
                ids.push(system.atoms().id(cell, n));
            }
        }
        Ok(ids)
    })
    .unwrap();

    let mut all_ids: Vec<i64> = ids.into_iter().flatten().collect();
    all_ids.sort_unstable();
    let expected: Vec<i64> = (0..(num_ranks * ATOMS_PER_RANK) as i64).collect();
    assert_eq!(all_ids, expected);
}
