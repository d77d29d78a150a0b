//! Bounded-width object id allocation
//!
//! Every simulated entity draws its identity from a fixed 16-bit namespace.
//! No two live objects share an id; released ids return to the free pool and
//! may be reused (lowest-free policy, not FIFO). Allocation and release run
//! on every object creation/destruction under combat load, so the pool is a
//! bitmap scanned a word at a time.

use bitvec::prelude::*;

use crate::error::GameError;
use crate::game::constants::ids::CAPACITY;

/// Unique identifier for a simulation object. Id 0 is reserved.
pub type ObjectId = u16;

/// Lowest-free id allocator over the fixed bit-width namespace
pub struct ObjectIdAllocator {
    /// One bit per id; set = allocated
    used: BitVec,
    live: usize,
}

impl ObjectIdAllocator {
    pub fn new() -> Self {
        let mut used = bitvec![0; CAPACITY];
        // Id 0 is "no object" and is never handed out
        used.set(0, true);
        Self { used, live: 0 }
    }

    /// Allocate the lowest currently-free id
    pub fn allocate(&mut self) -> Result<ObjectId, GameError> {
        match self.used.iter_zeros().next() {
            Some(idx) => {
                self.used.set(idx, true);
                self.live += 1;
                Ok(idx as ObjectId)
            }
            None => Err(GameError::CapacityExhausted { capacity: CAPACITY }),
        }
    }

    /// Return an id to the free pool. Releasing an id that is not currently
    /// allocated is a programming error.
    pub fn release(&mut self, id: ObjectId) {
        let idx = id as usize;
        debug_assert!(idx != 0, "id 0 is reserved and cannot be released");
        debug_assert!(self.used[idx], "release of unallocated id {}", id);
        if idx == 0 || !self.used[idx] {
            tracing::error!("release of unallocated id {}", id);
            return;
        }
        self.used.set(idx, false);
        self.live -= 1;
    }

    /// Number of currently-live ids
    pub fn live_count(&self) -> usize {
        self.live
    }
}

impl Default for ObjectIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_lowest_free() {
        let mut alloc = ObjectIdAllocator::new();
        assert_eq!(alloc.allocate().unwrap(), 1);
        assert_eq!(alloc.allocate().unwrap(), 2);
        assert_eq!(alloc.allocate().unwrap(), 3);
    }

    #[test]
    fn test_no_duplicate_live_ids() {
        let mut alloc = ObjectIdAllocator::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(alloc.allocate().unwrap()));
        }
    }

    #[test]
    fn test_released_id_eligible_for_reuse() {
        let mut alloc = ObjectIdAllocator::new();
        let a = alloc.allocate().unwrap();
        let _b = alloc.allocate().unwrap();
        alloc.release(a);
        // Lowest free id is the one just released
        assert_eq!(alloc.allocate().unwrap(), a);
    }

    #[test]
    fn test_live_count_tracks_churn() {
        let mut alloc = ObjectIdAllocator::new();
        let ids: Vec<_> = (0..10).map(|_| alloc.allocate().unwrap()).collect();
        assert_eq!(alloc.live_count(), 10);
        for id in &ids[..5] {
            alloc.release(*id);
        }
        assert_eq!(alloc.live_count(), 5);
    }

    #[test]
    fn test_capacity_exhausted() {
        let mut alloc = ObjectIdAllocator::new();
        // Namespace minus the reserved id 0
        for _ in 0..CAPACITY - 1 {
            alloc.allocate().unwrap();
        }
        assert!(matches!(
            alloc.allocate(),
            Err(GameError::CapacityExhausted { .. })
        ));
    }
}
