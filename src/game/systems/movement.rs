//! Player action step: intent resolution, movement, vitals, weapons
//!
//! Runs once per tick over every alive player. Movement speed is
//! direction-independent: diagonal flag input is normalized so it covers
//! the same distance per tick as a cardinal move.

use std::f32::consts::FRAC_1_SQRT_2;

use crate::config::GameConfig;
use crate::game::constants::{loot as loot_constants, player as player_constants, regen, zoom};
use crate::game::ids::ObjectId;
use crate::game::state::GameState;
use crate::game::systems::combat::WeaponController;
use crate::util::vec2::Vec2;

/// Turn raw input into a movement direction with magnitude 0..=1.
/// Touch input wins over flags when both are present.
fn resolve_intent(input: &crate::game::object::PlayerInput) -> Vec2 {
    if let Some((angle, magnitude)) = input.touch_move {
        return Vec2::from_angle(angle) * magnitude.clamp(0.0, 1.0);
    }
    let mut dir = Vec2::ZERO;
    if input.move_up {
        dir.y += 1.0;
    }
    if input.move_down {
        dir.y -= 1.0;
    }
    if input.move_right {
        dir.x += 1.0;
    }
    if input.move_left {
        dir.x -= 1.0;
    }
    if dir.x != 0.0 && dir.y != 0.0 {
        dir = dir * FRAC_1_SQRT_2;
    }
    dir
}

pub fn update(state: &mut GameState, config: &GameConfig, weapon: &mut dyn WeaponController) {
    let dt = config.dt();
    let bounds = Vec2::new(config.map_width, config.map_height);
    let ids: Vec<ObjectId> = state.alive_players.iter().copied().collect();
    let mut attackers: Vec<ObjectId> = Vec::new();

    for id in ids {
        let indoor = {
            let Some(player) = state.players.get(&id) else {
                continue;
            };
            state
                .buildings
                .values()
                .any(|b| b.scope_volume.contains(player.position))
        };

        let Some(player) = state.players.get_mut(&id) else {
            continue;
        };
        if player.dead {
            continue;
        }

        let mut changed = false;

        // Movement
        let dir = resolve_intent(&player.input);
        if dir != Vec2::ZERO {
            let next = player.position + dir * (player_constants::SPEED * dt);
            player.position = Vec2::new(next.x.clamp(0.0, bounds.x), next.y.clamp(0.0, bounds.y));
            player.invulnerable = false;
            player.moves_since_recompute += 1;
            changed = true;
        }

        // Facing changes give the player away just like moving does
        if (player.input.facing - player.facing).abs() > f32::EPSILON {
            player.facing = player.input.facing;
            player.invulnerable = false;
            changed = true;
        }

        // Spawn protection runs out on its own; acting drops it early and
        // the deadline with it
        if let Some(timer) = player.invuln_timer {
            if !player.invulnerable {
                player.invuln_timer = None;
            } else if timer <= 1 {
                player.invuln_timer = None;
                player.invulnerable = false;
                changed = true;
            } else {
                player.invuln_timer = Some(timer - 1);
            }
        }

        // Adrenaline drains toward zero while held
        if player.adrenaline > 0.0 {
            player.adrenaline =
                (player.adrenaline - player_constants::ADRENALINE_DRAIN_PER_SEC * dt).max(0.0);
            changed = true;
        }

        // Tiered passive regen, keyed on adrenaline. Per-tick amount is
        // rate / tick_rate so healing-per-second holds at any cadence.
        if player.adrenaline > 0.0 && player.health < player_constants::MAX_HEALTH {
            if let Some((_, rate)) = regen::TIERS.iter().find(|(min, _)| player.adrenaline > *min)
            {
                player.health = (player.health + rate / config.tick_rate as f32)
                    .min(player_constants::MAX_HEALTH);
                changed = true;
            }
        }

        // Structure occupancy forces close zoom; otherwise the optic rules
        if player.indoor != indoor {
            player.indoor = indoor;
            changed = true;
        }
        let wanted_zoom = if indoor { zoom::INDOOR } else { player.scope_zoom };
        if player.zoom != wanted_zoom {
            player.zoom = wanted_zoom;
            changed = true;
        }

        // Attack is edge-triggered; consume the flag and fire after the
        // player borrow is released
        if player.input.attack {
            player.input.attack = false;
            player.invulnerable = false;
            attackers.push(id);
            changed = true;
        }

        if changed {
            state.dirty.mark_partial(id);
        }
    }

    pick_up_loot(state);

    for shooter in attackers {
        weapon.attack(state, shooter);
    }
}

/// Walk-over pickup: loot converts to adrenaline, capped at the maximum.
/// First player checked wins a contested drop.
fn pick_up_loot(state: &mut GameState) {
    let reach = player_constants::RADIUS + loot_constants::PICKUP_RADIUS;
    let mut taken: Vec<(ObjectId, ObjectId)> = Vec::new();
    for item in state.loot.values() {
        let grabber = state.alive_players.iter().copied().find(|pid| {
            state
                .players
                .get(pid)
                .is_some_and(|p| p.position.distance_sq_to(item.position) <= reach * reach)
        });
        if let Some(pid) = grabber {
            taken.push((item.id, pid));
        }
    }
    for (loot_id, pid) in taken {
        state.loot.remove(&loot_id);
        state.delete_object(loot_id);
        if let Some(p) = state.players.get_mut(&pid) {
            p.adrenaline =
                (p.adrenaline + loot_constants::ADRENALINE_BOOST).min(player_constants::MAX_ADRENALINE);
            state.dirty.mark_partial(pid);
        }
    }
}
