//! Inter-rank communication: topology, one-sided windows, collectives and
//! the halo-exchange protocol

mod collective;
pub(crate) mod exchange;
mod topology;
mod window;

pub use collective::*;
pub use exchange::*;
pub use topology::*;
pub use window::*;
