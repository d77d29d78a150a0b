//! Dirty-state tracking
//!
//! World-scope mutation records accumulate anywhere in the tick; the diffing
//! phase narrows them per observer against that observer's visible set. All
//! world-scope sets are cleared at tick end — per-observer sets are owned and
//! cleared by the serialization layer once consumed.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::game::ids::ObjectId;

/// World-scope dirty sets, reset every tick
#[derive(Debug, Default)]
pub struct DirtyTracker {
    full: HashSet<ObjectId>,
    partial: HashSet<ObjectId>,
    deleted: HashSet<ObjectId>,
}

/// One observer's narrowed projection of the world dirty sets
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverDirty {
    pub full: Vec<ObjectId>,
    pub partial: Vec<ObjectId>,
    pub deleted: Vec<ObjectId>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The object's entire state must be resent
    pub fn mark_full(&mut self, id: ObjectId) {
        // Full implies partial is redundant
        self.partial.remove(&id);
        self.full.insert(id);
    }

    /// Only the object's mutable fields changed
    pub fn mark_partial(&mut self, id: ObjectId) {
        if !self.full.contains(&id) {
            self.partial.insert(id);
        }
    }

    /// The object left the simulation this tick
    pub fn mark_deleted(&mut self, id: ObjectId) {
        self.full.remove(&id);
        self.partial.remove(&id);
        self.deleted.insert(id);
    }

    pub fn is_deleted(&self, id: ObjectId) -> bool {
        self.deleted.contains(&id)
    }

    pub fn full(&self) -> &HashSet<ObjectId> {
        &self.full
    }

    pub fn partial(&self) -> &HashSet<ObjectId> {
        &self.partial
    }

    pub fn deleted(&self) -> &HashSet<ObjectId> {
        &self.deleted
    }

    /// Narrow the world sets to what one observer can see.
    ///
    /// Deletions are matched against `last_visible` as well: a deleted
    /// object has already left the spatial index by the time the refreshed
    /// visible set is computed, so only the set from before the refresh
    /// still contains it. Deletions of the observer itself are excluded: an
    /// observer is never told to delete its own representation.
    pub fn narrow_for_observer(
        &self,
        observer: ObjectId,
        visible: &HashSet<ObjectId>,
        last_visible: &HashSet<ObjectId>,
    ) -> ObserverDirty {
        let full: Vec<ObjectId> = self
            .full
            .iter()
            .filter(|id| visible.contains(*id))
            .copied()
            .collect();

        let partial: Vec<ObjectId> = self
            .partial
            .iter()
            .filter(|id| visible.contains(*id) && !self.full.contains(*id))
            .copied()
            .collect();

        let deleted: Vec<ObjectId> = self
            .deleted
            .iter()
            .filter(|id| {
                (visible.contains(*id) || last_visible.contains(*id)) && **id != observer
            })
            .copied()
            .collect();

        ObserverDirty {
            full,
            partial,
            deleted,
        }
    }

    /// Clear all world-scope sets at tick end
    pub fn reset(&mut self) {
        self.full.clear();
        self.partial.clear();
        self.deleted.clear();
    }
}
