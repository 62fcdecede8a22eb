//! Cell grid over a rank's sub-box, including the one-cell-thick halo ring

use anyhow::{anyhow, Result};
use strum_macros::EnumIter;

use crate::domain::SpatialDomain;

/// The six face directions of the grid, in the fixed wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Direction {
    XNeg,
    XPos,
    YNeg,
    YPos,
    ZNeg,
    ZPos,
}

impl Direction {
    /// Position of this direction in the fixed wire order
    pub fn index(self) -> usize {
        match self {
            Direction::XNeg => 0,
            Direction::XPos => 1,
            Direction::YNeg => 2,
            Direction::YPos => 3,
            Direction::ZNeg => 4,
            Direction::ZPos => 5,
        }
    }

    pub fn axis(self) -> usize {
        self.index() / 2
    }

    pub fn is_positive(self) -> bool {
        self.index() % 2 == 1
    }

    pub fn from_axis(axis: usize, positive: bool) -> Self {
        match (axis, positive) {
            (0, false) => Direction::XNeg,
            (0, true) => Direction::XPos,
            (1, false) => Direction::YNeg,
            (1, true) => Direction::YPos,
            (2, false) => Direction::ZNeg,
            (2, true) => Direction::ZPos,
            _ => panic!("No such axis: {}", axis),
        }
    }

    pub fn opposite(self) -> Self {
        Self::from_axis(self.axis(), !self.is_positive())
    }
}

/// Fixed-size cell partition of a sub-box
///
/// Interior cells occupy linear indices `0..my_cell_num` and are owned by
/// this rank; the surrounding halo ring occupies `my_cell_num..total_cell_num`
/// and only ever holds data in transit to or replicated from a neighbor.
pub struct CellGrid {
    /// Interior cells along each axis
    nxyz: [usize; 3],
    /// Edge lengths of a single cell
    cell_size: [f64; 3],
    my_cell_num: usize,
    total_cell_num: usize,
    /// Linear index for every coordinate of the halo-extended box
    index_of: Vec<usize>,
    /// Inverse of `index_of`
    coords_of: Vec<[isize; 3]>,
}

impl CellGrid {
    pub(crate) fn new(domain: &SpatialDomain, cutoff: f64) -> Result<Self> {
        let mut nxyz = [0usize; 3];
        let mut cell_size = [0.0; 3];
        for axis in 0..3 {
            let local = domain.my_max()[axis] - domain.my_min()[axis];
            let n = (local / cutoff).floor() as usize;
            if n == 0 {
                return Err(anyhow!(
                    "Sub-box length {} along axis {} is below the cutoff {}",
                    local, axis, cutoff));
            }
            nxyz[axis] = n;
            cell_size[axis] = local / n as f64;
        }
        let my_cell_num = nxyz[0] * nxyz[1] * nxyz[2];
        let total_cell_num = (nxyz[0] + 2) * (nxyz[1] + 2) * (nxyz[2] + 2);

        // Enumerate the halo-extended box, interior cells first so that the
        // ownership test is a single index comparison
        let mut index_of = vec![usize::MAX; total_cell_num];
        let mut coords_of = vec![[0isize; 3]; total_cell_num];
        let mut next_interior = 0;
        let mut next_halo = my_cell_num;
        for ix in -1..=nxyz[0] as isize {
            for iy in -1..=nxyz[1] as isize {
                for iz in -1..=nxyz[2] as isize {
                    let coords = [ix, iy, iz];
                    let interior = (0..3).all(|a| coords[a] >= 0 && coords[a] < nxyz[a] as isize);
                    let cell = if interior {
                        let [x, y, z] = coords;
                        let cell = x as usize
                            + nxyz[0] * (y as usize + nxyz[1] * z as usize);
                        debug_assert!(cell < my_cell_num);
                        next_interior += 1;
                        cell
                    } else {
                        let cell = next_halo;
                        next_halo += 1;
                        cell
                    };
                    index_of[Self::extended_offset(&nxyz, coords)] = cell;
                    coords_of[cell] = coords;
                }
            }
        }
        debug_assert_eq!(next_interior, my_cell_num);
        debug_assert_eq!(next_halo, total_cell_num);

        Ok(Self {
            nxyz,
            cell_size,
            my_cell_num,
            total_cell_num,
            index_of,
            coords_of,
        })
    }

    fn extended_offset(nxyz: &[usize; 3], coords: [isize; 3]) -> usize {
        let x = (coords[0] + 1) as usize;
        let y = (coords[1] + 1) as usize;
        let z = (coords[2] + 1) as usize;
        x + (nxyz[0] + 2) * (y + (nxyz[1] + 2) * z)
    }

    /// Interior cells along each axis
    pub fn dims(&self) -> [usize; 3] {
        self.nxyz
    }

    pub fn cell_size(&self) -> [f64; 3] {
        self.cell_size
    }

    /// Number of interior (owned) cells
    pub fn my_cell_num(&self) -> usize {
        self.my_cell_num
    }

    /// Number of cells including the halo ring
    pub fn total_cell_num(&self) -> usize {
        self.total_cell_num
    }

    pub fn is_interior(&self, cell: usize) -> bool {
        cell < self.my_cell_num
    }

    /// Linear index of a coordinate, or `None` outside the halo-extended box
    pub fn cell_at(&self, coords: [isize; 3]) -> Option<usize> {
        for axis in 0..3 {
            if coords[axis] < -1 || coords[axis] > self.nxyz[axis] as isize {
                return None;
            }
        }
        Some(self.index_of[Self::extended_offset(&self.nxyz, coords)])
    }

    /// Coordinate triple of a linear index
    pub fn coords(&self, cell: usize) -> [isize; 3] {
        self.coords_of[cell]
    }

    /// Cell holding a position, halo ring included
    ///
    /// A position outside the halo-extended box means an atom moved by more
    /// than one cell width in a single step, which the decomposition rules
    /// out; it is reported as an error, never clamped.
    pub fn cell_for_position(&self, domain: &SpatialDomain, pos: &[f64; 3]) -> Result<usize> {
        let mut coords = [0isize; 3];
        for axis in 0..3 {
            coords[axis] =
                ((pos[axis] - domain.my_min()[axis]) / self.cell_size[axis]).floor() as isize;
        }
        self.cell_at(coords).ok_or_else(|| {
            anyhow!(
                "Position {:?} lies outside the halo-extended grid of rank {} (cell coords {:?})",
                pos, domain.rank(), coords)
        })
    }

    /// True for interior cells whose contents must be replicated to at least
    /// one neighbor (the innermost layer on any face)
    pub(crate) fn is_ghost_source(&self, coords: [isize; 3]) -> bool {
        let interior =
            (0..3).all(|a| coords[a] >= 0 && coords[a] < self.nxyz[a] as isize);
        interior
            && (0..3).any(|a| coords[a] == 0 || coords[a] == self.nxyz[a] as isize - 1)
    }
}
