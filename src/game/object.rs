//! Simulation object variants
//!
//! A closed tagged set: the tick loop only needs identity, position, and
//! dirty-marking uniformly, so each variant is a plain struct implementing
//! [`SimObject`] and everything else is variant-specific data. Observer and
//! spectator relations are id lookups, never owning references.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::game::constants::{player, zoom};
use crate::game::ids::ObjectId;
use crate::util::vec2::Vec2;

/// Object category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Player,
    Loot,
    Bullet,
    Explosion,
    Building,
    Body,
}

/// Capability surface the tick loop needs from every object
pub trait SimObject {
    fn id(&self) -> ObjectId;
    fn position(&self) -> Vec2;
    fn kind(&self) -> ObjectKind;
}

/// Per-tick player intent, as received from the transport layer.
///
/// Movement comes either as directional flags (keyboard) or a single
/// angle+magnitude pair (touch); when `touch_move` is set it wins.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    /// Alternate input mode: movement angle in radians plus magnitude 0..=1
    pub touch_move: Option<(f32, f32)>,
    /// Facing direction in radians
    pub facing: f32,
    /// Attack initiated this tick
    pub attack: bool,
}

impl PlayerInput {
    pub fn clear(&mut self) {
        *self = Self {
            facing: self.facing,
            ..Self::default()
        };
    }
}

/// A player: simulation object and observer at once.
///
/// The visible set and recompute counter are observer state; they narrow the
/// world dirty sets to what this player can actually see.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ObjectId,
    pub name: String,
    pub position: Vec2,
    pub facing: f32,
    pub health: f32,
    pub adrenaline: f32,
    pub dead: bool,
    /// Still has a live connection (superset of alive: includes
    /// disconnected-but-spectatable and pending joiners)
    pub connected: bool,
    /// Join message received; eligible for per-tick updates
    pub joined: bool,
    /// Temporary spawn protection, cleared by moving, aiming, or attacking
    pub invulnerable: bool,
    /// Ticks of spawn protection left; expires even if the player never
    /// acts. Armed by the instance on join, cleared with the flag.
    pub invuln_timer: Option<u32>,
    /// Inside a structure's scope volume this tick
    pub indoor: bool,
    /// Current viewport zoom level
    pub zoom: u32,
    /// Zoom granted by the equipped optic
    pub scope_zoom: u32,
    /// Fraction of non-piercing damage mitigated by armor, 0..=1
    pub damage_reduction: f32,
    pub kills: u32,
    /// Player being spectated, if dead and watching someone
    pub spectating: Option<ObjectId>,
    pub input: PlayerInput,

    // Observer state
    pub visible: HashSet<ObjectId>,
    pub moves_since_recompute: u32,
}

impl Player {
    pub fn new(id: ObjectId, name: String, position: Vec2) -> Self {
        Self {
            id,
            name,
            position,
            facing: 0.0,
            health: player::MAX_HEALTH,
            adrenaline: 0.0,
            dead: false,
            connected: true,
            joined: false,
            invulnerable: true,
            invuln_timer: None,
            indoor: false,
            zoom: zoom::DEFAULT,
            scope_zoom: zoom::DEFAULT,
            damage_reduction: 0.0,
            kills: 0,
            spectating: None,
            input: PlayerInput::default(),
            visible: HashSet::new(),
            moves_since_recompute: 0,
        }
    }

    /// Can other players spectate this one
    pub fn spectatable(&self) -> bool {
        self.connected && !self.dead
    }
}

impl SimObject for Player {
    fn id(&self) -> ObjectId {
        self.id
    }
    fn position(&self) -> Vec2 {
        self.position
    }
    fn kind(&self) -> ObjectKind {
        ObjectKind::Player
    }
}

/// Ground loot (dropped items)
#[derive(Debug, Clone)]
pub struct Loot {
    pub id: ObjectId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub item: u32,
}

impl SimObject for Loot {
    fn id(&self) -> ObjectId {
        self.id
    }
    fn position(&self) -> Vec2 {
        self.position
    }
    fn kind(&self) -> ObjectKind {
        ObjectKind::Loot
    }
}

/// In-flight bullet
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: ObjectId,
    pub owner: ObjectId,
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub traveled: f32,
    pub max_distance: f32,
    /// Remaining targets this bullet can pass through
    pub penetration: u8,
    pub alive: bool,
    /// Players already hit, so penetration never double-counts a target
    pub hit: smallvec::SmallVec<[ObjectId; 4]>,
}

impl Bullet {
    pub fn new(id: ObjectId, owner: ObjectId, position: Vec2, direction: Vec2) -> Self {
        use crate::game::constants::bullet;
        Self {
            id,
            owner,
            position,
            direction: direction.normalize(),
            speed: bullet::SPEED,
            damage: bullet::DAMAGE,
            traveled: 0.0,
            max_distance: bullet::MAX_DISTANCE,
            penetration: 0,
            alive: true,
            hit: smallvec::SmallVec::new(),
        }
    }
}

impl SimObject for Bullet {
    fn id(&self) -> ObjectId {
        self.id
    }
    fn position(&self) -> Vec2 {
        self.position
    }
    fn kind(&self) -> ObjectKind {
        ObjectKind::Bullet
    }
}

/// One-tick explosion effect
#[derive(Debug, Clone)]
pub struct Explosion {
    pub id: ObjectId,
    pub position: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub source: ObjectId,
}

impl SimObject for Explosion {
    fn id(&self) -> ObjectId {
        self.id
    }
    fn position(&self) -> Vec2 {
        self.position
    }
    fn kind(&self) -> ObjectKind {
        ObjectKind::Explosion
    }
}

/// Axis-aligned box, used for structure scope volumes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Static structure. Standing inside its scope volume forces close zoom.
#[derive(Debug, Clone)]
pub struct Building {
    pub id: ObjectId,
    pub position: Vec2,
    pub scope_volume: Aabb,
}

impl SimObject for Building {
    fn id(&self) -> ObjectId {
        self.id
    }
    fn position(&self) -> Vec2 {
        self.position
    }
    fn kind(&self) -> ObjectKind {
        ObjectKind::Building
    }
}

/// Generic dynamic body (corpses, thrown props)
#[derive(Debug, Clone)]
pub struct Body {
    pub id: ObjectId,
    pub position: Vec2,
    pub velocity: Vec2,
}

impl SimObject for Body {
    fn id(&self) -> ObjectId {
        self.id
    }
    fn position(&self) -> Vec2 {
        self.position
    }
    fn kind(&self) -> ObjectKind {
        ObjectKind::Body
    }
}

/// Ephemeral emote, relayed to visible observers for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emote {
    pub player: ObjectId,
    pub kind: u32,
}

/// Kill-feed event produced during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KillFeedEvent {
    Killed {
        killer: Option<ObjectId>,
        victim: ObjectId,
    },
    Joined {
        player: ObjectId,
    },
    Left {
        player: ObjectId,
    },
    Won {
        winner: ObjectId,
    },
}
