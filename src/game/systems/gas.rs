//! Environmental hazard: the shrinking safe zone
//!
//! The gas follows a fixed radius/position schedule. "Inside the hazard"
//! means outside the current safe circle. Damage is piercing: it bypasses
//! armor and spawn protection, applied once per tick at dps / tick_rate.

use crate::config::GameConfig;
use crate::game::constants::gas as gas_constants;
use crate::game::state::GameState;
use crate::game::systems::combat::{self, DamageCause, DamageRecord};
use crate::util::vec2::Vec2;

/// One stage of the gas schedule
#[derive(Debug, Clone)]
pub struct GasStage {
    /// Seconds this stage holds before the next advance
    pub duration: f32,
    /// Safe-circle radius once this stage applies
    pub radius: f32,
    /// Safe-circle center once this stage applies
    pub position: Vec2,
    /// Damage per second outside the safe circle
    pub dps: f32,
}

/// Hazard state for one instance
pub struct Gas {
    schedule: Vec<GasStage>,
    stage: usize,
    pub position: Vec2,
    pub radius: f32,
    pub dps: f32,
    /// Ticks until the next stage advance; None until the match schedules it
    advance_timer: Option<u32>,
    /// Raised on advance, consumed by serialization, reset every tick
    dirty: bool,
}

impl Gas {
    pub fn new(config: &GameConfig) -> Self {
        let center = config.map_center();
        let initial_radius = config.map_width.max(config.map_height) * 0.75;
        let schedule = default_schedule(center, initial_radius);
        let first = &schedule[0];
        Self {
            position: first.position,
            radius: first.radius,
            dps: first.dps,
            schedule,
            stage: 0,
            advance_timer: None,
            dirty: false,
        }
    }

    /// Build a gas directly from a schedule (tests, custom maps)
    pub fn from_schedule(schedule: Vec<GasStage>) -> Self {
        assert!(!schedule.is_empty(), "gas schedule cannot be empty");
        let first = &schedule[0];
        Self {
            position: first.position,
            radius: first.radius,
            dps: first.dps,
            schedule,
            stage: 0,
            advance_timer: None,
            dirty: false,
        }
    }

    /// Is this position inside the hazard (outside the safe circle)
    pub fn is_inside(&self, position: Vec2) -> bool {
        position.distance_to(self.position) > self.radius
    }

    /// Radius of the safe circle after the next advance. Spawn rejection
    /// samples against this so late joiners land where the zone will be.
    pub fn future_radius(&self) -> f32 {
        self.schedule
            .get(self.stage + 1)
            .unwrap_or(&self.schedule[self.stage])
            .radius
    }

    /// Center of the safe circle after the next advance
    pub fn future_position(&self) -> Vec2 {
        self.schedule
            .get(self.stage + 1)
            .unwrap_or(&self.schedule[self.stage])
            .position
    }

    /// Arm the first advance. Called once when the match goes active.
    pub fn schedule_first_advance(&mut self, tick_rate: u32) {
        if self.advance_timer.is_none() {
            self.advance_timer =
                Some((gas_constants::FIRST_ADVANCE_DELAY * tick_rate as f32).ceil() as u32);
        }
    }

    /// Cancel any pending advance (instance teardown)
    pub fn cancel(&mut self) {
        self.advance_timer = None;
    }

    fn advance(&mut self, tick_rate: u32) {
        if self.stage + 1 >= self.schedule.len() {
            self.advance_timer = None;
            return;
        }
        self.stage += 1;
        let stage = &self.schedule[self.stage];
        self.position = stage.position;
        self.radius = stage.radius;
        self.dps = stage.dps;
        self.dirty = true;
        tracing::info!(
            stage = self.stage,
            radius = self.radius,
            dps = self.dps,
            "gas advanced"
        );
        self.advance_timer = if self.stage + 1 < self.schedule.len() {
            Some((stage.duration * tick_rate as f32).ceil() as u32)
        } else {
            None
        };
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

fn default_schedule(center: Vec2, initial_radius: f32) -> Vec<GasStage> {
    let mut schedule = vec![GasStage {
        duration: 0.0,
        radius: initial_radius,
        position: center,
        dps: 0.0,
    }];
    let mut radius = initial_radius;
    for i in 1..=6u32 {
        radius *= 0.6;
        schedule.push(GasStage {
            duration: 40.0,
            radius,
            position: center,
            dps: gas_constants::INITIAL_DPS * i as f32,
        });
    }
    schedule
}

/// Advance the gas schedule and apply hazard damage for this tick
pub fn update(state: &mut GameState, tick_rate: u32) {
    if let Some(timer) = state.gas.advance_timer {
        if timer <= 1 {
            state.gas.advance(tick_rate);
        } else {
            state.gas.advance_timer = Some(timer - 1);
        }
    }

    if state.gas.dps <= 0.0 {
        return;
    }

    let per_tick = state.gas.dps / tick_rate as f32;
    let victims: Vec<_> = state
        .alive_players
        .iter()
        .copied()
        .filter(|id| {
            state
                .players
                .get(id)
                .is_some_and(|p| !p.dead && state.gas.is_inside(p.position))
        })
        .collect();

    for target in victims {
        combat::apply_damage(
            state,
            DamageRecord {
                target,
                amount: per_tick,
                source: None,
                cause: DamageCause::Gas,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::object::Player;

    fn active_gas(dps: f32) -> Gas {
        Gas::from_schedule(vec![GasStage {
            duration: 0.0,
            radius: 50.0,
            position: Vec2::new(360.0, 360.0),
            dps,
        }])
    }

    fn state_with_player_at(pos: Vec2, dps: f32) -> (GameState, u16) {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        let id = state.ids.allocate().unwrap();
        let mut player = Player::new(id, "gassed".to_string(), pos);
        player.invulnerable = false;
        state.players.insert(id, player);
        state.alive_players.insert(id);
        state.connected_players.insert(id);
        state.gas = active_gas(dps);
        (state, id)
    }

    #[test]
    fn test_is_inside_means_outside_safe_circle() {
        let gas = active_gas(1.0);
        assert!(!gas.is_inside(Vec2::new(360.0, 360.0)));
        assert!(!gas.is_inside(Vec2::new(360.0, 400.0)));
        assert!(gas.is_inside(Vec2::new(360.0, 420.0)));
    }

    #[test]
    fn test_dps_ten_at_ten_hz_is_one_per_tick() {
        // Player far outside the safe circle
        let (mut state, id) = state_with_player_at(Vec2::new(100.0, 100.0), 10.0);
        update(&mut state, 10);
        let health = state.players[&id].health;
        assert!((health - 99.0).abs() < 1e-4, "expected 99.0, got {}", health);
        update(&mut state, 10);
        assert!((state.players[&id].health - 98.0).abs() < 1e-4);
    }

    #[test]
    fn test_gas_bypasses_protection() {
        let (mut state, id) = state_with_player_at(Vec2::new(100.0, 100.0), 10.0);
        {
            let player = state.players.get_mut(&id).unwrap();
            player.invulnerable = true;
            player.damage_reduction = 0.5;
        }
        update(&mut state, 10);
        assert!((state.players[&id].health - 99.0).abs() < 1e-4);
    }

    #[test]
    fn test_player_in_safe_circle_untouched() {
        let (mut state, id) = state_with_player_at(Vec2::new(360.0, 360.0), 10.0);
        update(&mut state, 10);
        assert_eq!(state.players[&id].health, 100.0);
    }

    #[test]
    fn test_advance_fires_after_scheduled_delay() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        state.gas = Gas::from_schedule(vec![
            GasStage {
                duration: 0.0,
                radius: 500.0,
                position: Vec2::new(360.0, 360.0),
                dps: 0.0,
            },
            GasStage {
                duration: 40.0,
                radius: 300.0,
                position: Vec2::new(360.0, 360.0),
                dps: 2.0,
            },
        ]);
        state.gas.advance_timer = Some(3);

        update(&mut state, 30);
        update(&mut state, 30);
        assert_eq!(state.gas.radius, 500.0);
        update(&mut state, 30);
        assert_eq!(state.gas.radius, 300.0);
        assert_eq!(state.gas.dps, 2.0);
        assert!(state.gas.is_dirty());
    }

    #[test]
    fn test_future_radius_is_next_stage() {
        let gas = Gas::from_schedule(vec![
            GasStage {
                duration: 0.0,
                radius: 500.0,
                position: Vec2::ZERO,
                dps: 0.0,
            },
            GasStage {
                duration: 40.0,
                radius: 300.0,
                position: Vec2::ZERO,
                dps: 1.0,
            },
        ]);
        assert_eq!(gas.future_radius(), 300.0);
    }
}
