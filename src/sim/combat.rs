//! Collision and damage resolution
//!
//! Runs once per tick after all actors have moved, in a fixed order:
//! player/enemy contact, obstacle push-out, player shots against enemies
//! and the boss, enemy shots against the player, then drop collection.
//! Actors hit zero HP here get flagged; the purge at end of tick drops them.

use glam::Vec2;

use super::enemy::{Enemy, EnemyKind};
use super::state::{Drop, DropKind, GameEvent, WorldState};
use crate::clamp_to_world;
use crate::consts::{DROP_HOMING_SPEED, DROP_MAGNET_RADIUS};

/// Result of a single damage application. Immune targets block the hit
/// entirely; the caller still runs its own side effects (a blocked hit
/// consumes a non-piercing projectile).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Applied,
    Blocked,
}

#[inline]
fn overlaps(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) < (ra + rb) * (ra + rb)
}

/// Shield-then-health application for a regular enemy. Enemies have no
/// immune state, so this never blocks.
fn damage_enemy(enemy: &mut Enemy, amount: f32) -> DamageOutcome {
    let absorbed = amount.min(enemy.shield);
    enemy.shield -= absorbed;
    enemy.hp -= amount - absorbed;
    DamageOutcome::Applied
}

/// Death side effects run exactly once, gated on the removal flag
fn kill_enemy(state: &mut WorldState, index: usize) {
    let (id, pos, max_hp, kind) = {
        let enemy = &mut state.enemies[index];
        if enemy.removed {
            return;
        }
        enemy.removed = true;
        (enemy.id, enemy.pos, enemy.max_hp, enemy.kind)
    };
    spawn_drop(state, pos, max_hp);
    state.stats.record_kill(kind.name());
    state.push_event(GameEvent::EnemyKilled {
        id,
        kind: kind.name(),
    });
}

fn spawn_drop(state: &mut WorldState, pos: Vec2, max_hp: f32) {
    let value = ((max_hp / 10.0) as u32).max(1);
    let id = state.next_entity_id();
    state.drops.push(Drop::new(id, pos, DropKind::Energy, value));
}

pub(crate) fn resolve_combat(state: &mut WorldState, dt: f32) {
    contact_damage(state, dt);
    obstacle_push_out(state);
    player_shots_vs_enemies(state);
    enemy_shots_vs_player(state);
    collect_drops(state, dt);
}

/// Touching enemies grind the player down continuously; a kamikaze
/// detonates instead, dealing its full damage once and removing itself.
fn contact_damage(state: &mut WorldState, dt: f32) {
    let Some(player) = state.player.as_ref() else {
        return;
    };
    let (player_pos, player_radius) = (player.pos, player.radius);

    let mut raw = 0.0;
    let mut detonated: Vec<usize> = Vec::new();

    for (i, enemy) in state.enemies.iter().enumerate() {
        if enemy.removed || !overlaps(enemy.pos, enemy.radius, player_pos, player_radius) {
            continue;
        }
        if enemy.kind == EnemyKind::Kamikaze {
            raw += enemy.damage;
            detonated.push(i);
        } else {
            raw += enemy.damage * dt;
        }
    }

    if let Some(boss) = &state.boss {
        if !boss.removed && overlaps(boss.pos, boss.radius, player_pos, player_radius) {
            raw += boss.damage * dt;
        }
    }

    // A detonation leaves no corpse and no drop
    for i in detonated {
        state.enemies[i].removed = true;
    }

    if raw > 0.0 {
        apply_player_damage(state, raw);
    }
}

fn apply_player_damage(state: &mut WorldState, raw: f32) {
    if let Some(player) = state.player.as_mut() {
        let (absorbed, taken) = player.absorb_damage(raw);
        if absorbed > 0.0 {
            state.events.push(GameEvent::ShieldAbsorbed { amount: absorbed });
        }
        if taken > 0.0 {
            state.events.push(GameEvent::PlayerHit { damage: taken });
        }
    }
}

/// Obstacles are solid for the player only; resolve overlap by sliding
/// the player out along the contact normal.
fn obstacle_push_out(state: &mut WorldState) {
    let Some(player) = state.player.as_mut() else {
        return;
    };
    for obstacle in &state.obstacles {
        let delta = player.pos - obstacle.pos;
        let dist = delta.length();
        let min_dist = player.radius + obstacle.radius;
        if dist < min_dist {
            let normal = if dist > 0.0 {
                delta / dist
            } else {
                Vec2::new(1.0, 0.0)
            };
            player.pos = obstacle.pos + normal * min_dist;
        }
    }
    player.pos = clamp_to_world(player.pos, player.radius);
}

fn player_shots_vs_enemies(state: &mut WorldState) {
    let mut shots = std::mem::take(&mut state.player_shots);
    let mut kills: Vec<usize> = Vec::new();

    for shot in shots.iter_mut() {
        if shot.removed {
            continue;
        }

        for i in 0..state.enemies.len() {
            let enemy = &mut state.enemies[i];
            if enemy.removed || enemy.hp <= 0.0 {
                continue;
            }
            if !overlaps(shot.pos, shot.radius, enemy.pos, enemy.radius) {
                continue;
            }

            if shot.is_piercing() {
                // At most one damage application per target per projectile
                if shot.has_hit(enemy.id) {
                    continue;
                }
                shot.mark_hit(enemy.id);
            }

            damage_enemy(enemy, shot.damage);
            state.events.push(GameEvent::EnemyHit {
                id: enemy.id,
                damage: shot.damage,
                crit: shot.crit,
            });
            if enemy.hp <= 0.0 {
                kills.push(i);
            }

            if !shot.is_piercing() {
                shot.removed = true;
                break;
            }
        }

        if shot.removed {
            continue;
        }

        // The boss is checked after the crowd, same hit rules
        let mut boss_died = false;
        if let Some(boss) = state.boss.as_mut() {
            if !boss.removed
                && boss.hp > 0.0
                && overlaps(shot.pos, shot.radius, boss.pos, boss.radius)
            {
                let already = shot.is_piercing() && shot.has_hit(boss.id);
                if !already {
                    match boss.take_damage(shot.damage) {
                        DamageOutcome::Applied => {
                            // Hit history records damage applications, not
                            // attempts; a blocked hit stays retryable
                            shot.mark_hit(boss.id);
                            state.events.push(GameEvent::EnemyHit {
                                id: boss.id,
                                damage: shot.damage,
                                crit: shot.crit,
                            });
                            boss_died = boss.hp <= 0.0;
                        }
                        DamageOutcome::Blocked => {
                            state.events.push(GameEvent::DamageBlocked { id: boss.id });
                        }
                    }
                    // A blocked hit still consumes a non-piercing shot
                    if !shot.is_piercing() {
                        shot.removed = true;
                    }
                }
            }
        }
        if boss_died {
            kill_boss(state);
        }
    }

    state.player_shots = shots;

    for i in kills {
        kill_enemy(state, i);
    }
}

fn kill_boss(state: &mut WorldState) {
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    if boss.removed {
        return;
    }
    boss.removed = true;
    let (id, pos, max_hp, kind) = (boss.id, boss.pos, boss.max_hp, boss.kind);
    log::info!("boss defeated: {}", kind.name());
    spawn_drop(state, pos, max_hp);
    state.stats.record_kill(kind.name());
    state.push_event(GameEvent::EnemyKilled {
        id,
        kind: kind.name(),
    });
    state.push_event(GameEvent::EncounterCleared);
}

fn enemy_shots_vs_player(state: &mut WorldState) {
    let Some(player) = state.player.as_ref() else {
        return;
    };
    let (player_pos, player_radius) = (player.pos, player.radius);

    let mut raw = 0.0;
    for shot in state.enemy_shots.iter_mut() {
        if shot.removed || !overlaps(shot.pos, shot.radius, player_pos, player_radius) {
            continue;
        }
        raw += shot.damage;
        shot.removed = true;
    }
    if raw > 0.0 {
        apply_player_damage(state, raw);
    }
}

/// Drops inside the magnet radius home in; contact collects them and
/// credits the run total exactly once.
fn collect_drops(state: &mut WorldState, dt: f32) {
    let Some(player) = state.player.as_ref() else {
        return;
    };
    let (player_pos, player_radius) = (player.pos, player.radius);

    let mut energy = 0u64;
    let mut currency = 0u64;
    for drop in state.drops.iter_mut() {
        if drop.removed {
            continue;
        }
        let delta = player_pos - drop.pos;
        let dist = delta.length();
        if dist < DROP_MAGNET_RADIUS && dist > 0.0 {
            drop.pos += delta / dist * DROP_HOMING_SPEED * dt;
        }
        if overlaps(drop.pos, drop.radius, player_pos, player_radius) {
            drop.removed = true;
            match drop.kind {
                DropKind::Energy => energy += drop.value as u64,
                DropKind::Currency => currency += drop.value as u64,
            }
            state.events.push(GameEvent::DropCollected { value: drop.value });
        }
    }
    state.stats.energy_collected += energy;
    state.stats.currency_collected += currency;
}
