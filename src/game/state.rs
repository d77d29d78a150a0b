//! World state for one simulation instance
//!
//! The tick body exclusively owns everything here. Typed collections serve
//! as the disjoint-by-role world sets: membership in a collection, not a
//! flag alone, determines which tick phases an object participates in.

use hashbrown::{HashMap, HashSet};

use crate::config::GameConfig;
use crate::game::constants::zoom;
use crate::game::dirty::DirtyTracker;
use crate::game::ids::{ObjectId, ObjectIdAllocator};
use crate::game::object::{
    Body, Building, Bullet, Emote, Explosion, KillFeedEvent, Loot, ObjectKind, Player, SimObject,
};
use crate::game::systems::gas::Gas;
use crate::game::visibility::VisibilityGrid;
use crate::util::vec2::Vec2;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for enough players
    Waiting,
    /// Match in progress
    Active,
    /// Match decided, grace period before teardown
    Over,
    /// Torn down; ticks short-circuit and do not reschedule
    Stopped,
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Waiting
    }
}

/// Match lifecycle state. Delayed transitions are deadline counters checked
/// at tick boundaries; cancellation is clearing the counter, which cannot
/// race the tick body because everything runs on it.
#[derive(Debug, Default)]
pub struct MatchState {
    pub phase: GamePhase,
    /// Ticks until Waiting commits to Active, if the start condition held
    pub start_timer: Option<u32>,
    /// Ticks until Over becomes Stopped
    pub over_timer: Option<u32>,
    pub winner: Option<ObjectId>,
    /// The survivor's victory notification is sent exactly once
    pub victory_sent: bool,
}

/// Complete world state
pub struct GameState {
    pub tick: u64,
    pub match_state: MatchState,

    // Role collections (disjoint by object category)
    pub players: HashMap<ObjectId, Player>,
    pub loot: HashMap<ObjectId, Loot>,
    pub bullets: Vec<Bullet>,
    pub explosions: Vec<Explosion>,
    pub buildings: HashMap<ObjectId, Building>,
    pub bodies: HashMap<ObjectId, Body>,

    // Membership sets over players
    pub alive_players: HashSet<ObjectId>,
    pub connected_players: HashSet<ObjectId>,

    // Per-tick scratch, cleared at tick end
    pub emotes: Vec<Emote>,
    pub kill_feed: Vec<KillFeedEvent>,

    pub dirty: DirtyTracker,
    pub visibility: VisibilityGrid,
    /// World-wide flag: every observer recomputes its visible set this tick
    /// (set when any object spawns or despawns)
    pub force_visibility_refresh: bool,
    pub gas: Gas,
    pub ids: ObjectIdAllocator,
    /// Ids freed this tick; returned to the pool at tick end so a deletion
    /// and a reuse of the same id can never land in one observer delta
    pending_release: Vec<ObjectId>,
    pub stopped: bool,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            tick: 0,
            match_state: MatchState::default(),
            players: HashMap::new(),
            loot: HashMap::new(),
            bullets: Vec::new(),
            explosions: Vec::new(),
            buildings: HashMap::new(),
            bodies: HashMap::new(),
            alive_players: HashSet::new(),
            connected_players: HashSet::new(),
            emotes: Vec::new(),
            kill_feed: Vec::new(),
            dirty: DirtyTracker::new(),
            visibility: VisibilityGrid::new(config.map_width, config.map_height, &zoom::LEVELS),
            force_visibility_refresh: false,
            gas: Gas::new(config),
            ids: ObjectIdAllocator::new(),
            pending_release: Vec::new(),
            stopped: false,
        }
    }

    pub fn alive_count(&self) -> usize {
        self.alive_players.len()
    }

    pub fn get_player(&self, id: ObjectId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_player_mut(&mut self, id: ObjectId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Register a static structure. Map objects are immutable for the
    /// instance's lifetime, so they go straight into the static grid half.
    pub fn add_building(&mut self, position: Vec2, scope_volume: crate::game::object::Aabb) -> Result<ObjectId, crate::error::GameError> {
        let id = self.ids.allocate()?;
        self.visibility.insert_static(id, position);
        self.buildings.insert(
            id,
            Building {
                id,
                position,
                scope_volume,
            },
        );
        Ok(id)
    }

    /// Fire a bullet into the active set, marking it for sync
    pub fn spawn_bullet(&mut self, owner: ObjectId, position: Vec2, direction: Vec2) -> Result<ObjectId, crate::error::GameError> {
        let id = self.ids.allocate()?;
        self.bullets.push(Bullet::new(id, owner, position, direction));
        self.dirty.mark_full(id);
        self.force_visibility_refresh = true;
        Ok(id)
    }

    /// Place an explosive charge. It detonates in the next combat phase
    /// and leaves the world there.
    pub fn spawn_explosion(
        &mut self,
        position: Vec2,
        radius: f32,
        damage: f32,
        source: ObjectId,
    ) -> Result<ObjectId, crate::error::GameError> {
        let id = self.ids.allocate()?;
        self.explosions.push(Explosion {
            id,
            position,
            radius,
            damage,
            source,
        });
        self.dirty.mark_full(id);
        self.force_visibility_refresh = true;
        Ok(id)
    }

    /// Drop a ground item
    pub fn spawn_loot(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        item: u32,
    ) -> Result<ObjectId, crate::error::GameError> {
        let id = self.ids.allocate()?;
        self.loot.insert(
            id,
            Loot {
                id,
                position,
                velocity,
                item,
            },
        );
        self.dirty.mark_full(id);
        self.force_visibility_refresh = true;
        Ok(id)
    }

    /// Drop a corpse at the dead player's position
    pub fn spawn_body(&mut self, position: Vec2) -> Result<ObjectId, crate::error::GameError> {
        let id = self.ids.allocate()?;
        self.bodies.insert(
            id,
            Body {
                id,
                position,
                velocity: Vec2::ZERO,
            },
        );
        self.dirty.mark_full(id);
        self.force_visibility_refresh = true;
        Ok(id)
    }

    /// Remove an object from the world and mark it deleted for sync. The id
    /// goes back to the free pool at tick end, not here: an allocation later
    /// in the same tick must not hand the id out again while the deletion
    /// notification for it is still pending.
    pub fn delete_object(&mut self, id: ObjectId) {
        self.dirty.mark_deleted(id);
        self.pending_release.push(id);
        self.force_visibility_refresh = true;
    }

    /// Positions of every dynamic object, for the per-tick grid rebuild
    pub fn dynamic_positions(&self) -> Vec<(ObjectId, Vec2)> {
        fn entry(obj: &impl SimObject) -> (ObjectId, Vec2) {
            (obj.id(), obj.position())
        }
        let mut out = Vec::with_capacity(
            self.players.len()
                + self.loot.len()
                + self.bullets.len()
                + self.explosions.len()
                + self.bodies.len(),
        );
        out.extend(self.players.values().filter(|p| !p.dead).map(entry));
        out.extend(self.loot.values().map(entry));
        out.extend(self.bullets.iter().filter(|b| b.alive).map(entry));
        out.extend(self.explosions.iter().map(entry));
        out.extend(self.bodies.values().map(entry));
        out
    }

    /// Category tag for a live id, for full-sync entries in observer deltas
    pub fn object_kind(&self, id: ObjectId) -> Option<ObjectKind> {
        if let Some(p) = self.players.get(&id) {
            return Some(p.kind());
        }
        if let Some(l) = self.loot.get(&id) {
            return Some(l.kind());
        }
        if let Some(b) = self.buildings.get(&id) {
            return Some(b.kind());
        }
        if let Some(b) = self.bodies.get(&id) {
            return Some(b.kind());
        }
        if let Some(b) = self.bullets.iter().find(|b| b.id == id) {
            return Some(b.kind());
        }
        self.explosions.iter().find(|e| e.id == id).map(|e| e.kind())
    }

    /// Clear per-tick scratch state. Runs after all observers are diffed.
    pub fn reset_tick_scratch(&mut self) {
        for id in self.pending_release.drain(..) {
            self.ids.release(id);
        }
        self.dirty.reset();
        self.emotes.clear();
        self.kill_feed.clear();
        self.force_visibility_refresh = false;
        self.gas.clear_dirty();
    }
}
