//! Drift integration for unattended objects
//!
//! Loot and bodies can be launched (death knockback, explosion pushes)
//! and then coast to a stop under drag. Players integrate their own
//! movement; this pass only touches the passive objects.

use crate::config::GameConfig;
use crate::game::constants::physics as phys;
use crate::game::state::GameState;
use crate::util::vec2::Vec2;

fn step(position: &mut Vec2, velocity: &mut Vec2, bounds: Vec2, dt: f32) -> bool {
    if velocity.length_sq() < phys::REST_SPEED * phys::REST_SPEED {
        *velocity = Vec2::ZERO;
        return false;
    }
    *velocity = velocity.clamp_length(phys::MAX_VELOCITY) * (1.0 - phys::DRAG);
    position.x = (position.x + velocity.x * dt).clamp(0.0, bounds.x);
    position.y = (position.y + velocity.y * dt).clamp(0.0, bounds.y);
    true
}

pub fn update(state: &mut GameState, config: &GameConfig) {
    let dt = config.dt();
    let bounds = Vec2::new(config.map_width, config.map_height);

    let mut moved = Vec::new();
    for loot in state.loot.values_mut() {
        if step(&mut loot.position, &mut loot.velocity, bounds, dt) {
            moved.push(loot.id);
        }
    }
    for body in state.bodies.values_mut() {
        if step(&mut body.position, &mut body.velocity, bounds, dt) {
            moved.push(body.id);
        }
    }
    for id in moved {
        state.dirty.mark_partial(id);
        state.force_visibility_refresh = true;
    }
}
