//! Collective reductions over the rank group

use std::sync::{Barrier, Mutex};

/// Barrier-delimited allreduce helper
///
/// Each reduction is collective: every rank deposits its contribution, the
/// group synchronizes, every rank reads the combined result, and a second
/// synchronization releases the slots for reuse.
pub struct Collective {
    size: usize,
    barrier: Barrier,
    counts: Mutex<Vec<usize>>,
    values: Mutex<Vec<[f64; 3]>>,
}

impl Collective {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            size,
            barrier: Barrier::new(size),
            counts: Mutex::new(vec![0; size]),
            values: Mutex::new(vec![[0.0; 3]; size]),
        }
    }

    /// Number of ranks in the group
    pub fn size(&self) -> usize {
        self.size
    }

    /// Collective barrier
    pub fn barrier(&self) {
        self.barrier.wait();
    }

    /// Sum an integer contribution across all ranks
    pub fn all_sum_count(&self, rank: usize, value: usize) -> usize {
        self.counts.lock().unwrap()[rank] = value;
        self.barrier.wait();
        let total = self.counts.lock().unwrap().iter().sum();
        self.barrier.wait();
        total
    }

    /// Element-wise sum of a three-vector across all ranks
    pub fn all_sum_vec3(&self, rank: usize, value: [f64; 3]) -> [f64; 3] {
        self.values.lock().unwrap()[rank] = value;
        self.barrier.wait();
        let mut total = [0.0; 3];
        for contribution in self.values.lock().unwrap().iter() {
            for axis in 0..3 {
                total[axis] += contribution[axis];
            }
        }
        self.barrier.wait();
        total
    }

    /// Sum a scalar contribution across all ranks
    pub fn all_sum(&self, rank: usize, value: f64) -> f64 {
        self.all_sum_vec3(rank, [value, 0.0, 0.0])[0]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sums_cover_all_ranks() {
        let collective = Collective::new(4);
        let totals = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|rank| {
                    let collective = &collective;
                    scope.spawn(move |_| {
                        let count = collective.all_sum_count(rank, rank + 1);
                        let vec = collective.all_sum_vec3(rank, [rank as f64, 1.0, 0.5]);
                        (count, vec)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        })
        .unwrap();
        for (count, vec) in totals {
            assert_eq!(count, 10);
            assert_eq!(vec, [6.0, 4.0, 2.0]);
        }
    }
}
