//! Spatial-decomposition core for parallel particle simulations
//!
//! The global simulation box is split across a 3D grid of ranks, one worker
//! per sub-box. Each rank partitions its sub-box into fixed-capacity cells
//! surrounded by a one-cell halo ring, tracks which atoms it owns, migrates
//! atoms between cells (and ranks) as they move, and replicates boundary
//! atoms to its neighbors as read-only ghosts through a six-directional,
//! one-sided halo exchange with epoch-fence synchronization and periodic
//! boundary correction.
//!
//! Force evaluation, integration and initialization are external: they read
//! and write atom data through [`AtomStore`] and call
//! [`LocalSystem::migrate_and_exchange`] whenever atoms may have crossed a
//! cell boundary.

pub mod atoms;
pub mod cells;
pub mod comm;
pub mod domain;
mod migrate;
pub mod system;

pub use atoms::AtomStore;
pub use cells::{CellGrid, Direction};
pub use comm::{AtomRecord, Collective, CommTopology, HaloComm, Window};
pub use domain::{Decomposition, SpatialDomain};
pub use system::{run_group, LocalSystem};
