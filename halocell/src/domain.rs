//! Decomposition of the global simulation box into per-rank sub-domains

use anyhow::{anyhow, Result};
use num::Integer;

use crate::cells::Direction;

/// Global description of a decomposed simulation run
///
/// All ranks are constructed from the same `Decomposition`, so the derived
/// geometry (sub-boxes, cell grids, communication lists) is consistent across
/// the whole group without further negotiation.
#[derive(Clone, Debug)]
pub struct Decomposition {
    /// Number of ranks along each axis
    pub grid: [usize; 3],
    /// Lower corner of the global box
    pub origin: [f64; 3],
    /// Edge lengths of the global box
    pub extent: [f64; 3],
    /// Minimum cell width (the interaction cutoff)
    pub cutoff: f64,
    /// Fixed atom capacity of a single cell
    pub cell_capacity: usize,
}

impl Decomposition {
    pub fn validate(&self) -> Result<()> {
        if self.grid.iter().any(|&n| n == 0) {
            return Err(anyhow!("Rank grid {:?} has an empty axis", self.grid));
        }
        if !(self.cutoff > 0.0) {
            return Err(anyhow!("Cell cutoff must be positive (got {})", self.cutoff));
        }
        if self.cell_capacity == 0 {
            return Err(anyhow!("Cell capacity must be at least 1"));
        }
        for axis in 0..3 {
            let local = self.extent[axis] / self.grid[axis] as f64;
            // Every sub-box needs at least one full cell per axis
            if !(local >= self.cutoff) {
                return Err(anyhow!(
                    "Sub-box length {} along axis {} is below the cutoff {}",
                    local, axis, self.cutoff));
            }
        }
        Ok(())
    }

    /// Total number of ranks in the grid
    pub fn num_ranks(&self) -> usize {
        self.grid[0] * self.grid[1] * self.grid[2]
    }

    /// Linear rank of a grid position
    pub fn rank_at(&self, position: [usize; 3]) -> usize {
        position[0] + self.grid[0] * (position[1] + self.grid[1] * position[2])
    }

    /// Grid position of a linear rank
    pub fn position_of(&self, rank: usize) -> [usize; 3] {
        let (rest, x) = rank.div_rem(&self.grid[0]);
        let (z, y) = rest.div_rem(&self.grid[1]);
        [x, y, z]
    }
}

/// This rank's sub-box of the global volume
///
/// Static for the lifetime of the decomposition.
pub struct SpatialDomain {
    rank: usize,
    position: [usize; 3],
    grid: [usize; 3],
    my_min: [f64; 3],
    my_max: [f64; 3],
    global_extent: [f64; 3],
}

impl SpatialDomain {
    pub(crate) fn new(layout: &Decomposition, rank: usize) -> Result<Self> {
        if rank >= layout.num_ranks() {
            return Err(anyhow!("Rank {} outside grid {:?}", rank, layout.grid));
        }
        let position = layout.position_of(rank);
        let mut my_min = [0.0; 3];
        let mut my_max = [0.0; 3];
        for axis in 0..3 {
            let local = layout.extent[axis] / layout.grid[axis] as f64;
            my_min[axis] = layout.origin[axis] + position[axis] as f64 * local;
            my_max[axis] = my_min[axis] + local;
        }
        Ok(Self {
            rank,
            position,
            grid: layout.grid,
            my_min,
            my_max,
            global_extent: layout.extent,
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn position(&self) -> [usize; 3] {
        self.position
    }

    pub fn grid(&self) -> [usize; 3] {
        self.grid
    }

    /// Lower corner of this rank's sub-box
    pub fn my_min(&self) -> [f64; 3] {
        self.my_min
    }

    /// Upper corner of this rank's sub-box
    pub fn my_max(&self) -> [f64; 3] {
        self.my_max
    }

    pub fn global_extent(&self) -> [f64; 3] {
        self.global_extent
    }

    /// Periodic coordinate shift for data received across `face`
    ///
    /// Non-zero only when this rank sits on the global boundary of the face's
    /// axis: position 0 receiving across the negative face maps coordinates
    /// down by one global extent, the last position receiving across the
    /// positive face maps them up. The rule depends only on the receiving
    /// rank's own grid position, which also covers a rank that is its own
    /// neighbor along an axis.
    pub(crate) fn receive_shift(&self, face: Direction) -> [f64; 3] {
        let mut shift = [0.0; 3];
        let axis = face.axis();
        if !face.is_positive() && self.position[axis] == 0 {
            shift[axis] = -self.global_extent[axis];
        }
        if face.is_positive() && self.position[axis] + 1 == self.grid[axis] {
            shift[axis] = self.global_extent[axis];
        }
        shift
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn layout() -> Decomposition {
        Decomposition {
            grid: [2, 1, 3],
            origin: [0.0, 0.0, 0.0],
            extent: [12.0, 6.0, 18.0],
            cutoff: 2.0,
            cell_capacity: 8,
        }
    }

    #[test]
    fn rank_position_roundtrip() {
        let layout = layout();
        for rank in 0..layout.num_ranks() {
            assert_eq!(layout.rank_at(layout.position_of(rank)), rank);
        }
    }

    #[test]
    fn sub_boxes_tile_the_volume() {
        let layout = layout();
        let domain = SpatialDomain::new(&layout, layout.rank_at([1, 0, 2])).unwrap();
        assert_eq!(domain.my_min(), [6.0, 0.0, 12.0]);
        assert_eq!(domain.my_max(), [12.0, 6.0, 18.0]);
    }

    #[test]
    fn receive_shift_only_on_global_faces() {
        let layout = layout();
        let lower = SpatialDomain::new(&layout, layout.rank_at([0, 0, 1])).unwrap();
        assert_eq!(lower.receive_shift(Direction::XNeg), [-12.0, 0.0, 0.0]);
        assert_eq!(lower.receive_shift(Direction::XPos), [0.0, 0.0, 0.0]);
        // Single rank along y: both wrap conditions hold, one per face
        assert_eq!(lower.receive_shift(Direction::YNeg), [0.0, -6.0, 0.0]);
        assert_eq!(lower.receive_shift(Direction::YPos), [0.0, 6.0, 0.0]);
        assert_eq!(lower.receive_shift(Direction::ZNeg), [0.0, 0.0, 0.0]);
    }
}
