//! Ballistic drift of an FCC lattice across a 2x2x2 rank grid
//!
//! Seeds every rank's sub-box with an FCC lattice, draws Maxwell-Boltzmann
//! momenta, removes the net momentum and rescales to the target temperature,
//! then lets the atoms drift freely with a migration/exchange cycle per step.
//! The reported global atom count must stay constant for the whole run.

use anyhow::Result;
use rand::SeedableRng;
use rand_distr::Distribution;

use halocell::{run_group, Decomposition, LocalSystem};

const LATTICE_CONST: f64 = 1.8;
const CUTOFF: f64 = 2.4;
const TEMPERATURE: f64 = 0.8;
const MASS: f64 = 1.0;
const DT: f64 = 0.05;
const NUM_STEPS: usize = 20;
const RNG_SEED: u64 = 5436576605279307334;

// Four-atom FCC basis, in fractions of the unit cell
const FCC_BASIS: [[f64; 3]; 4] = [
    [0.25, 0.25, 0.25],
    [0.25, 0.75, 0.75],
    [0.75, 0.25, 0.75],
    [0.75, 0.75, 0.25],
];

/// Place the part of the global lattice that falls into this rank's sub-box
fn seed_lattice(system: &mut LocalSystem, lattice_cells: [usize; 3]) -> Result<()> {
    let lo = system.domain().my_min();
    let hi = system.domain().my_max();
    let mut begin = [0isize; 3];
    let mut end = [0isize; 3];
    for axis in 0..3 {
        begin[axis] = (lo[axis] / LATTICE_CONST).floor() as isize;
        end[axis] = (hi[axis] / LATTICE_CONST).ceil() as isize;
    }
    for ix in begin[0]..end[0] {
        for iy in begin[1]..end[1] {
            for iz in begin[2]..end[2] {
                for (b, basis) in FCC_BASIS.iter().enumerate() {
                    let pos = [
                        (ix as f64 + basis[0]) * LATTICE_CONST,
                        (iy as f64 + basis[1]) * LATTICE_CONST,
                        (iz as f64 + basis[2]) * LATTICE_CONST,
                    ];
                    if (0..3).any(|a| pos[a] < lo[a] || pos[a] >= hi[a]) {
                        continue;
                    }
                    // Global id from the lattice coordinates
                    let id = b as i64
                        + 4 * (iz as i64 + lattice_cells[2] as i64
                            * (iy as i64 + lattice_cells[1] as i64 * ix as i64));
                    system.create_atom(id, pos, [0.0; 3])?;
                }
            }
        }
    }
    Ok(())
}

/// Kinetic energy of the atoms owned by this rank
fn local_kinetic(system: &LocalSystem) -> f64 {
    let mut kinetic = 0.0;
    for cell in 0..system.cells().my_cell_num() {
        for n in 0..system.atoms().count(cell) {
            let p = system.atoms().momentum(cell, n);
            kinetic += (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]) / (2.0 * MASS);
        }
    }
    kinetic
}

fn main() -> Result<()> {
    let layout = Decomposition {
        grid: [2, 2, 2],
        origin: [0.0; 3],
        extent: [14.4, 14.4, 14.4],
        cutoff: CUTOFF,
        cell_capacity: 32,
    };
    let lattice_cells = [
        (layout.extent[0] / LATTICE_CONST).round() as usize,
        (layout.extent[1] / LATTICE_CONST).round() as usize,
        (layout.extent[2] / LATTICE_CONST).round() as usize,
    ];

    let totals = run_group(&layout, |system, comm| -> Result<usize> {
        let rank = system.domain().rank();
        let collective = comm.collective();
        seed_lattice(system, lattice_cells)?;

        // Establish the initial global count and the ghost ring
        system.migrate_and_exchange(comm)?;
        let initial_total = system.total_atom_count();
        if rank == 0 {
            println!("Seeded {} atoms on {} ranks", initial_total, collective.size());
        }

        // Maxwell-Boltzmann momenta
        let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(RNG_SEED + rank as u64);
        let normal = rand_distr::Normal::new(0.0, (MASS * TEMPERATURE).sqrt())?;
        let mut net = [0.0; 3];
        for cell in 0..system.cells().my_cell_num() {
            for n in 0..system.atoms().count(cell) {
                let p = system.atoms_mut().momentum_mut(cell, n);
                for axis in 0..3 {
                    p[axis] = normal.sample(&mut rng);
                    net[axis] += p[axis];
                }
            }
        }
        // Remove the net momentum of the whole system
        let net = collective.all_sum_vec3(rank, net);
        for cell in 0..system.cells().my_cell_num() {
            for n in 0..system.atoms().count(cell) {
                let p = system.atoms_mut().momentum_mut(cell, n);
                for axis in 0..3 {
                    p[axis] -= net[axis] / initial_total as f64;
                }
            }
        }
        // Rescale to the target temperature
        let kinetic = collective.all_sum(rank, local_kinetic(system));
        let current = 2.0 * kinetic / (3.0 * initial_total as f64);
        let factor = (TEMPERATURE / current).sqrt();
        for cell in 0..system.cells().my_cell_num() {
            for n in 0..system.atoms().count(cell) {
                let p = system.atoms_mut().momentum_mut(cell, n);
                for axis in 0..3 {
                    p[axis] *= factor;
                }
            }
        }

        for step in 1..=NUM_STEPS {
            // Free drift; forces are somebody else's job
            for cell in 0..system.cells().my_cell_num() {
                for n in 0..system.atoms().count(cell) {
                    let p = system.atoms().momentum(cell, n);
                    let pos = system.atoms_mut().position_mut(cell, n);
                    for axis in 0..3 {
                        pos[axis] += p[axis] / MASS * DT;
                    }
                }
            }
            system.migrate_and_exchange(comm)?;

            let kinetic = collective.all_sum(rank, local_kinetic(system));
            let temperature = 2.0 * kinetic / (3.0 * system.total_atom_count() as f64);
            if rank == 0 {
                println!(
                    "step {:3}  atoms {}  T {:.4}",
                    step, system.total_atom_count(), temperature);
            }
            if system.total_atom_count() != initial_total {
                anyhow::bail!(
                    "Rank {}: global count changed from {} to {}",
                    rank, initial_total, system.total_atom_count());
            }
        }
        Ok(system.atoms().my_num())
    })?;

    println!("Final owned atoms per rank: {:?}", totals);
    Ok(())
}
