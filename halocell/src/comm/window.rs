//! One-sided communication windows shared by the rank group

use std::sync::{Barrier, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use bytemuck::{Pod, Zeroable};

use crate::cells::Direction;

/// Wire record for one atom crossing a rank boundary
///
/// Forces and potentials are never transferred; a migrated atom has its force
/// recomputed by the new owner and a ghost only ever contributes position,
/// momentum and identity.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AtomRecord {
    pub id: i64,
    pub pos: [f64; 3],
    pub momenta: [f64; 3],
}

/// A set of per-rank memory regions with epoch-fence synchronization
///
/// The owning rank writes its own region between fences; in the following
/// epoch any rank may read any region directly, no rank ever writes a region
/// it does not own. `fence` is collective: every rank must reach it once per
/// epoch, unconditionally, even with nothing to publish — a rank that skips
/// a fence stalls the whole group.
pub struct Window<R> {
    regions: Vec<RwLock<R>>,
    fence: Barrier,
}

impl<R> Window<R> {
    pub(crate) fn new(regions: Vec<R>) -> Self {
        let fence = Barrier::new(regions.len());
        Self {
            regions: regions.into_iter().map(RwLock::new).collect(),
            fence,
        }
    }

    /// Collective epoch fence
    pub fn fence(&self) {
        self.fence.wait();
    }

    /// Write access to the region owned by `rank`
    pub(crate) fn own(&self, rank: usize) -> RwLockWriteGuard<R> {
        self.regions[rank].write().unwrap()
    }

    /// Direct read access to any rank's region
    pub(crate) fn peer(&self, rank: usize) -> RwLockReadGuard<R> {
        self.regions[rank].read().unwrap()
    }
}

/// Region holding replicated boundary atoms for all six directions
///
/// Layout: six cumulative record counts (one after each direction in wire
/// order) followed by the packed records, concatenated in the same order.
pub struct GhostRegion {
    offsets: [usize; 6],
    records: Box<[AtomRecord]>,
}

impl GhostRegion {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            offsets: [0; 6],
            records: vec![AtomRecord::zeroed(); capacity].into_boxed_slice(),
        }
    }

    pub(crate) fn write(&mut self, n: usize, record: AtomRecord) -> Result<()> {
        if n >= self.records.len() {
            return Err(anyhow!(
                "Ghost buffer overflow (capacity {} records)", self.records.len()));
        }
        self.records[n] = record;
        Ok(())
    }

    /// Close the cumulative count for `dir` at `n` packed records
    pub(crate) fn set_offset(&mut self, dir: Direction, n: usize) {
        self.offsets[dir.index()] = n;
    }

    /// The packed records of a single direction
    pub(crate) fn slice(&self, dir: Direction) -> &[AtomRecord] {
        let end = self.offsets[dir.index()];
        let start = match dir.index() {
            0 => 0,
            i => self.offsets[i - 1],
        };
        &self.records[start..end]
    }
}

/// Region holding the atoms leaving through one axis' pair of faces
///
/// Layout: the two block lengths (negative first) followed by the packed
/// records, negative block first. Reused for every axis of the exchange.
pub struct MigrationRegion {
    counts: [usize; 2],
    records: Box<[AtomRecord]>,
}

impl MigrationRegion {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            counts: [0; 2],
            records: vec![AtomRecord::zeroed(); capacity].into_boxed_slice(),
        }
    }

    pub(crate) fn write(&mut self, n: usize, record: AtomRecord) -> Result<()> {
        if n >= self.records.len() {
            return Err(anyhow!(
                "Migration buffer overflow (capacity {} records)", self.records.len()));
        }
        self.records[n] = record;
        Ok(())
    }

    pub(crate) fn set_counts(&mut self, negative: usize, positive: usize) {
        self.counts = [negative, positive];
    }

    /// Atoms leaving toward the negative neighbor
    pub(crate) fn leaving_negative(&self) -> &[AtomRecord] {
        &self.records[..self.counts[0]]
    }

    /// Atoms leaving toward the positive neighbor
    pub(crate) fn leaving_positive(&self) -> &[AtomRecord] {
        &self.records[self.counts[0]..self.counts[0] + self.counts[1]]
    }
}
