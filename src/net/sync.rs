//! Synchronization boundary between the simulation and the transport
//!
//! The tick loop produces one [`ObserverUpdate`] per joined observer and
//! hands it to an [`UpdateSink`]. The sink is the transport's side of the
//! contract: the simulation never blocks on it, and delivery failures are
//! the transport's problem.

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::dirty::ObserverDirty;
use crate::game::ids::ObjectId;
use crate::game::object::{Emote, KillFeedEvent, ObjectKind};
use crate::util::vec2::Vec2;

/// Gas state as observers see it, sent only on advance ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasUpdate {
    pub position: Vec2,
    pub radius: f32,
    pub dps: f32,
}

/// One observer's per-tick delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverUpdate {
    pub observer: ObjectId,
    pub tick: u64,
    pub dirty: ObserverDirty,
    /// Category tags for the ids in `dirty.full`, so receivers know what
    /// they are instantiating
    pub spawned: Vec<(ObjectId, ObjectKind)>,
    pub kill_feed: Vec<KillFeedEvent>,
    pub emotes: Vec<Emote>,
    pub gas: Option<GasUpdate>,
}

impl ObserverUpdate {
    /// An update with nothing in it does not need to go on the wire
    pub fn is_empty(&self) -> bool {
        self.dirty.full.is_empty()
            && self.dirty.partial.is_empty()
            && self.dirty.deleted.is_empty()
            && self.kill_feed.is_empty()
            && self.emotes.is_empty()
            && self.gas.is_none()
    }
}

/// Static map description, encoded once at instance creation and replayed
/// to every joiner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDescription {
    pub width: f32,
    pub height: f32,
    pub buildings: Vec<MapBuilding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapBuilding {
    pub id: ObjectId,
    pub position: Vec2,
    pub scope_min: Vec2,
    pub scope_max: Vec2,
}

/// Raised when the instance stops, so the owner can reap it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownSignal {
    pub tick: u64,
}

/// Delivery surface the transport implements. Called from the tick body,
/// so implementations must hand off without blocking.
pub trait UpdateSink: Send {
    fn deliver_update(&mut self, observer: ObjectId, update: ObserverUpdate);
    fn deliver_snapshot(&mut self, observer: ObjectId, snapshot: &[u8]);
    fn deliver_victory(&mut self, observer: ObjectId);
}

/// Encode a message for the wire
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, GameError> {
    bincode::serde::encode_to_vec(msg, bincode::config::legacy())
        .map_err(|e| GameError::Encode(e.to_string()))
}
