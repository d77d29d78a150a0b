//! Match lifecycle: phase transitions and spawn placement
//!
//! All transitions are evaluated once per tick, after the simulation
//! systems run. Delayed transitions are deadline counters on the match
//! state; cancelling one is just clearing the counter.

use rand::Rng;

use crate::config::GameConfig;
use crate::game::ids::ObjectId;
use crate::game::object::KillFeedEvent;
use crate::game::state::{GamePhase, GameState};
use crate::game::systems::gas::Gas;
use crate::util::vec2::Vec2;

/// Rejection-sampling attempts before giving up and spawning at the
/// safe-zone center
const PLACEMENT_ATTEMPTS: u32 = 64;

/// How a new player is placed into the world
#[derive(Debug, Clone, Copy)]
pub enum SpawnMode {
    /// Exact position (tests, tutorial maps)
    Fixed(Vec2),
    /// Anywhere within a circle
    Random { center: Vec2, radius: f32 },
    /// Anywhere the safe zone will still cover after its next advance,
    /// so late joiners never spawn into land the gas is about to take
    GasRejection,
}

/// Source of candidate positions for rejection sampling. Game modes with
/// curated spawn points provide their own.
pub trait PlacementProvider: Send {
    fn sample(&mut self, bounds: Vec2) -> Vec2;
}

/// Uniform candidates over the whole map
#[derive(Debug, Default)]
pub struct UniformPlacement;

impl PlacementProvider for UniformPlacement {
    fn sample(&mut self, bounds: Vec2) -> Vec2 {
        let mut rng = rand::thread_rng();
        Vec2::new(rng.gen_range(0.0..bounds.x), rng.gen_range(0.0..bounds.y))
    }
}

/// Resolve a spawn mode to a concrete position
pub fn spawn_position(
    mode: SpawnMode,
    gas: &Gas,
    bounds: Vec2,
    placement: &mut dyn PlacementProvider,
) -> Vec2 {
    match mode {
        SpawnMode::Fixed(pos) => pos,
        SpawnMode::Random { center, radius } => {
            let mut rng = rand::thread_rng();
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            // sqrt keeps the distribution uniform over area
            let dist = radius * rng.gen::<f32>().sqrt();
            center + Vec2::from_angle(angle) * dist
        }
        SpawnMode::GasRejection => {
            let target = gas.future_position();
            let radius = gas.future_radius();
            for _ in 0..PLACEMENT_ATTEMPTS {
                let candidate = placement.sample(bounds);
                if candidate.distance_to(target) <= radius {
                    return candidate;
                }
            }
            tracing::warn!("placement sampling exhausted, spawning at zone center");
            target
        }
    }
}

/// Tick-boundary lifecycle events the instance owner reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Waiting committed to Active
    MatchStarted,
    /// The field collapsed to a single survivor
    VictoryDecided { winner: ObjectId },
    /// Grace period elapsed; the instance should be torn down
    Teardown,
}

/// Evaluate phase transitions for this tick
pub fn evaluate(state: &mut GameState, config: &GameConfig) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();

    match state.match_state.phase {
        GamePhase::Waiting => {
            // Debounced start: the countdown only survives while the
            // player count holds
            if state.alive_count() >= 2 {
                if state.match_state.start_timer.is_none() {
                    state.match_state.start_timer = Some(config.start_delay_ticks());
                    tracing::info!(players = state.alive_count(), "start countdown armed");
                }
            } else if state.match_state.start_timer.take().is_some() {
                tracing::info!("start countdown cancelled");
            }

            if let Some(timer) = state.match_state.start_timer {
                if timer <= 1 {
                    state.match_state.start_timer = None;
                    state.match_state.phase = GamePhase::Active;
                    state.gas.schedule_first_advance(config.tick_rate);
                    tracing::info!(players = state.alive_count(), "match started");
                    events.push(LifecycleEvent::MatchStarted);
                } else {
                    state.match_state.start_timer = Some(timer - 1);
                }
            }
        }
        GamePhase::Active => {
            if state.alive_count() < 2 {
                state.match_state.phase = GamePhase::Over;
                state.match_state.over_timer = Some(config.over_delay_ticks());
                state.gas.cancel();

                let winner = state.alive_players.iter().next().copied();
                state.match_state.winner = winner;
                if let Some(winner) = winner {
                    // The survivor coasts through the grace period with
                    // stale input discarded
                    if let Some(player) = state.players.get_mut(&winner) {
                        player.input.clear();
                    }
                    state.kill_feed.push(KillFeedEvent::Won { winner });
                    tracing::info!(winner, "match over");
                    events.push(LifecycleEvent::VictoryDecided { winner });
                } else {
                    tracing::info!("match over with no survivor");
                }
            }
        }
        GamePhase::Over => {
            if let Some(timer) = state.match_state.over_timer {
                if timer <= 1 {
                    state.match_state.over_timer = None;
                    state.match_state.phase = GamePhase::Stopped;
                    state.stopped = true;
                    tracing::info!(tick = state.tick, "instance stopped");
                    events.push(LifecycleEvent::Teardown);
                } else {
                    state.match_state.over_timer = Some(timer - 1);
                }
            }
        }
        GamePhase::Stopped => {}
    }

    events
}
