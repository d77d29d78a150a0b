/// Tick cadence constants
pub mod tick {
    /// Default simulation tick rate in Hz
    pub const RATE: u32 = 30;
    /// Processing-duration samples per load report window
    pub const LOAD_SAMPLE_WINDOW: usize = 200;
}

/// Object identity constants
pub mod ids {
    /// Bit width of the object id namespace
    pub const ID_BITS: u32 = 16;
    /// Total namespace capacity (id 0 is reserved as "no object")
    pub const CAPACITY: usize = 1 << ID_BITS;
}

/// Player tuning
pub mod player {
    /// Base movement speed in units/second
    pub const SPEED: f32 = 12.0;
    /// Collision radius in units
    pub const RADIUS: f32 = 1.0;
    /// Full health
    pub const MAX_HEALTH: f32 = 100.0;
    /// Full adrenaline
    pub const MAX_ADRENALINE: f32 = 100.0;
    /// Adrenaline drained per second while positive
    pub const ADRENALINE_DRAIN_PER_SEC: f32 = 0.5;
    /// Temporary invulnerability after spawn, in seconds
    pub const SPAWN_INVULN_DURATION: f32 = 5.0;
}

/// Passive health regeneration tiers, keyed on adrenaline thresholds.
/// Each tier's rate is per second; the per-tick amount is rate / tick_rate
/// so total regen-per-second is tier-constant regardless of tick rate.
pub mod regen {
    /// (adrenaline above this, health per second)
    pub const TIERS: [(f32, f32); 4] = [(87.5, 4.75), (50.0, 3.75), (25.0, 1.5), (0.0, 0.5)];
}

/// Viewport zoom levels. A fixed closed set registered with the visibility
/// grid at startup; querying anything else fails fast.
pub mod zoom {
    /// Zoom forced while the observer is inside a structure
    pub const INDOOR: u32 = 12;
    /// Default zoom with no optic equipped
    pub const DEFAULT: u32 = 28;
    /// All registered levels (indoor, bare, 2x, 4x, 8x optics)
    pub const LEVELS: [u32; 5] = [INDOOR, DEFAULT, 36, 48, 68];
}

/// Bullet tuning
pub mod bullet {
    /// Default bullet speed in units/second
    pub const SPEED: f32 = 90.0;
    /// Default maximum travel distance in units
    pub const MAX_DISTANCE: f32 = 120.0;
    /// Default damage per hit
    pub const DAMAGE: f32 = 12.0;
}

/// Explosive charge tuning
pub mod explosion {
    /// Blast radius in units
    pub const RADIUS: f32 = 6.0;
    /// Flat damage to everything inside the blast
    pub const DAMAGE: f32 = 40.0;
    /// How far ahead of the thrower a charge lands
    pub const THROW_DISTANCE: f32 = 10.0;
}

/// Ground loot tuning
pub mod loot {
    /// Pickup distance from the player center
    pub const PICKUP_RADIUS: f32 = 1.5;
    /// Adrenaline granted per pickup, capped at `player::MAX_ADRENALINE`
    pub const ADRENALINE_BOOST: f32 = 35.0;
}

/// Drift physics for unattended objects (loot, bodies)
pub mod physics {
    /// Per-tick velocity decay factor
    pub const DRAG: f32 = 0.08;
    /// Velocity magnitude cap in units/second
    pub const MAX_VELOCITY: f32 = 40.0;
    /// Speed below which drift stops entirely
    pub const REST_SPEED: f32 = 0.05;
}

/// Shrinking safe-zone ("gas") defaults
pub mod gas {
    /// Damage per second of the first damaging stage
    pub const INITIAL_DPS: f32 = 1.0;
    /// Seconds from match start to the first gas advance
    pub const FIRST_ADVANCE_DELAY: f32 = 80.0;
}
