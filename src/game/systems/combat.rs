//! Projectile simulation and damage resolution
//!
//! Two-phase update: every live bullet advances and records its hits, and
//! only then does any damage apply. Within a single tick no kill can shadow
//! another bullet's target, so simultaneous trades resolve symmetrically
//! regardless of bullet iteration order.

use smallvec::SmallVec;

use crate::game::constants::{explosion as explosion_constants, player as player_constants};
use crate::game::ids::ObjectId;
use crate::game::state::GameState;
use crate::util::vec2::Vec2;

/// What dealt the damage. Gas is piercing: armor and spawn protection
/// do not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageCause {
    Bullet,
    Explosion,
    Gas,
}

/// A pending damage application, recorded in phase one and applied in
/// phase two
#[derive(Debug, Clone, Copy)]
pub struct DamageRecord {
    pub target: ObjectId,
    pub amount: f32,
    pub source: Option<ObjectId>,
    pub cause: DamageCause,
}

/// Weapon behavior behind the attack input. The default arena weapon
/// fires a single bullet along the shooter's facing; game modes swap in
/// their own controller.
pub trait WeaponController: Send {
    fn attack(&mut self, state: &mut GameState, shooter: ObjectId);
}

/// Stock single-shot weapon
#[derive(Debug, Default)]
pub struct BulletWeapon;

impl WeaponController for BulletWeapon {
    fn attack(&mut self, state: &mut GameState, shooter: ObjectId) {
        let Some(player) = state.get_player(shooter) else {
            return;
        };
        let origin = player.position;
        let direction = Vec2::from_angle(player.facing);
        // muzzle offset keeps the bullet from instantly colliding with
        // the shooter's own radius
        let start = origin + direction * (player_constants::RADIUS * 1.5);
        if let Err(err) = state.spawn_bullet(shooter, start, direction) {
            tracing::warn!(?err, shooter, "could not spawn bullet");
        }
    }
}

/// Grenade-style weapon: lobs a charge ahead of the shooter that
/// detonates on the following tick, damaging everyone in the blast
/// radius including the thrower.
#[derive(Debug, Default)]
pub struct ExplosiveWeapon;

impl WeaponController for ExplosiveWeapon {
    fn attack(&mut self, state: &mut GameState, shooter: ObjectId) {
        let Some(player) = state.get_player(shooter) else {
            return;
        };
        let at = player.position
            + Vec2::from_angle(player.facing) * explosion_constants::THROW_DISTANCE;
        if let Err(err) = state.spawn_explosion(
            at,
            explosion_constants::RADIUS,
            explosion_constants::DAMAGE,
            shooter,
        ) {
            tracing::warn!(?err, shooter, "could not spawn explosion");
        }
    }
}

/// Closest approach of point `p` to segment `a..b`, squared
fn segment_distance_sq(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance_sq_to(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_sq_to(a + ab * t)
}

/// Advance all bullets, then apply all recorded damage
pub fn update(state: &mut GameState, dt: f32) {
    let mut pending: SmallVec<[DamageRecord; 8]> = SmallVec::new();

    // Phase one: movement and hit detection. Split borrows so bullet
    // mutation and player reads can coexist.
    {
        let GameState {
            bullets,
            players,
            alive_players,
            dirty,
            ..
        } = state;

        for bullet in bullets.iter_mut().filter(|b| b.alive) {
            let from = bullet.position;
            let step = bullet.speed * dt;
            let to = from + bullet.direction * step;
            bullet.position = to;
            bullet.traveled += step;
            dirty.mark_partial(bullet.id);

            for &target in alive_players.iter() {
                if target == bullet.owner || bullet.hit.contains(&target) {
                    continue;
                }
                let Some(player) = players.get(&target) else {
                    continue;
                };
                let r = player_constants::RADIUS;
                if segment_distance_sq(from, to, player.position) <= r * r {
                    bullet.hit.push(target);
                    pending.push(DamageRecord {
                        target,
                        amount: bullet.damage,
                        source: Some(bullet.owner),
                        cause: DamageCause::Bullet,
                    });
                    if bullet.penetration == 0 {
                        bullet.alive = false;
                        break;
                    }
                    bullet.penetration -= 1;
                }
            }

            if bullet.traveled >= bullet.max_distance {
                bullet.alive = false;
            }
        }
    }

    // Explosions placed last tick detonate now: one blast, everyone in
    // radius, the thrower included.
    for explosion in &state.explosions {
        for &target in state.alive_players.iter() {
            let Some(player) = state.players.get(&target) else {
                continue;
            };
            let reach = explosion.radius + player_constants::RADIUS;
            if player.position.distance_sq_to(explosion.position) <= reach * reach {
                pending.push(DamageRecord {
                    target,
                    amount: explosion.damage,
                    source: Some(explosion.source),
                    cause: DamageCause::Explosion,
                });
            }
        }
    }

    // Phase two: every hit recorded above lands, including hits from
    // bullets whose owner died this same tick.
    for record in pending {
        apply_damage(state, record);
    }

    // Expired bullets leave the world after damage resolution
    let dead: Vec<ObjectId> = state
        .bullets
        .iter()
        .filter(|b| !b.alive)
        .map(|b| b.id)
        .collect();
    state.bullets.retain(|b| b.alive);
    for id in dead {
        state.delete_object(id);
    }

    // Spent explosions likewise
    let spent: Vec<ObjectId> = state.explosions.drain(..).map(|e| e.id).collect();
    for id in spent {
        state.delete_object(id);
    }
}

/// Apply one damage record, handling mitigation and death
pub fn apply_damage(state: &mut GameState, record: DamageRecord) {
    let piercing = record.cause == DamageCause::Gas;
    let died;
    let position;
    {
        let Some(player) = state.players.get_mut(&record.target) else {
            return;
        };
        if player.dead {
            return;
        }
        if !piercing && player.invulnerable {
            return;
        }
        let amount = if piercing {
            record.amount
        } else {
            record.amount * (1.0 - player.damage_reduction)
        };
        player.health -= amount;
        died = player.health <= 0.0;
        position = player.position;
        if died {
            player.health = 0.0;
            player.dead = true;
        }
    }
    state.dirty.mark_partial(record.target);

    if !died {
        return;
    }

    state.alive_players.remove(&record.target);
    state.dirty.mark_full(record.target);
    state.force_visibility_refresh = true;
    state.kill_feed.push(crate::game::object::KillFeedEvent::Killed {
        killer: record.source,
        victim: record.target,
    });
    if let Some(killer) = record.source.filter(|&k| k != record.target) {
        if let Some(k) = state.players.get_mut(&killer) {
            k.kills += 1;
            state.dirty.mark_partial(killer);
        }
    }
    if let Err(err) = state.spawn_body(position) {
        tracing::error!(?err, "could not spawn body for dead player");
    }
    // Dead players leave their stash behind for whoever gets there first
    if let Err(err) = state.spawn_loot(position, Vec2::ZERO, 0) {
        tracing::error!(?err, "could not drop loot for dead player");
    }
}
