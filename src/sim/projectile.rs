//! Player and enemy projectiles: straight shots, piercing shots, and
//! turn-rate-limited homing missiles.
//!
//! Projectiles are owned by the world once fired; an emitter dying never
//! invalidates its shots. Homing targets are held by entity id (a weak
//! reference): a stale id degrades to re-acquisition or straight flight.

use glam::Vec2;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::state::WorldState;
use crate::{angle_to_dir, out_of_world, turn_toward};

/// Player missile tuning
const MISSILE_LAUNCH_SPEED: f32 = 100.0;
const MISSILE_MAX_SPEED: f32 = 450.0;
const MISSILE_ACCEL: f32 = 300.0;
const MISSILE_TURN_RATE: f32 = 5.0;
const MISSILE_LIFETIME: f32 = 2.5;

/// Enemy missile tuning (slower, clumsier than the player's)
const ENEMY_MISSILE_TURN_RATE: f32 = 2.5;
const ENEMY_MISSILE_LIFETIME: f32 = 4.0;

/// Per-shot behaviour variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShotKind {
    Normal,
    /// Passes through targets; each target is damaged at most once
    Piercing { hit: FxHashSet<u32> },
    /// Steers toward a target enemy, re-acquiring when it dies
    Missile { target: Option<u32>, lifetime: f32 },
}

/// A player-aligned projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shot {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Fixed at creation; crit doubling is already baked in
    pub damage: f32,
    pub crit: bool,
    pub removed: bool,
    pub kind: ShotKind,
}

impl Shot {
    pub fn normal(id: u32, pos: Vec2, aim: f32, damage: f32, crit: bool) -> Self {
        Self {
            id,
            pos,
            vel: angle_to_dir(aim) * 300.0,
            radius: 5.0,
            damage,
            crit,
            removed: false,
            kind: ShotKind::Normal,
        }
    }

    pub fn piercing(id: u32, pos: Vec2, aim: f32, damage: f32, crit: bool) -> Self {
        Self {
            id,
            pos,
            vel: angle_to_dir(aim) * 250.0,
            radius: 7.0,
            damage,
            crit,
            removed: false,
            kind: ShotKind::Piercing {
                hit: FxHashSet::default(),
            },
        }
    }

    pub fn missile(id: u32, pos: Vec2, aim: f32, damage: f32, crit: bool, target: Option<u32>) -> Self {
        Self {
            id,
            pos,
            vel: angle_to_dir(aim) * MISSILE_LAUNCH_SPEED,
            radius: 8.0,
            damage,
            crit,
            removed: false,
            kind: ShotKind::Missile {
                target,
                lifetime: MISSILE_LIFETIME,
            },
        }
    }

    pub fn is_piercing(&self) -> bool {
        matches!(self.kind, ShotKind::Piercing { .. })
    }

    /// Piercing hit history; always false for other kinds
    pub fn has_hit(&self, target_id: u32) -> bool {
        match &self.kind {
            ShotKind::Piercing { hit } => hit.contains(&target_id),
            _ => false,
        }
    }

    pub fn mark_hit(&mut self, target_id: u32) {
        if let ShotKind::Piercing { hit } = &mut self.kind {
            hit.insert(target_id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyShotKind {
    Straight,
    /// Homes on the player at a limited turn rate
    Missile,
}

/// An enemy-aligned projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyShot {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub kind: EnemyShotKind,
    /// Missiles expire; straight shots only leave via the world border
    pub lifetime: Option<f32>,
    pub removed: bool,
}

impl EnemyShot {
    pub fn new(
        id: u32,
        pos: Vec2,
        aim: f32,
        speed: f32,
        radius: f32,
        damage: f32,
        kind: EnemyShotKind,
    ) -> Self {
        Self {
            id,
            pos,
            vel: angle_to_dir(aim) * speed,
            radius,
            damage,
            kind,
            lifetime: match kind {
                EnemyShotKind::Missile => Some(ENEMY_MISSILE_LIFETIME),
                EnemyShotKind::Straight => None,
            },
            removed: false,
        }
    }
}

/// Nearest living enemy to `pos`, by id; used for missile targeting
/// at launch and for re-acquisition in flight
pub(crate) fn nearest_enemy_id(state: &WorldState, pos: Vec2) -> Option<u32> {
    let mut nearest = None;
    let mut best = f32::INFINITY;
    for enemy in &state.enemies {
        if enemy.removed {
            continue;
        }
        let d = enemy.pos.distance_squared(pos);
        if d < best {
            best = d;
            nearest = Some(enemy.id);
        }
    }
    if let Some(boss) = &state.boss {
        if !boss.removed && boss.pos.distance_squared(pos) < best {
            nearest = Some(boss.id);
        }
    }
    nearest
}

fn target_pos(state: &WorldState, target_id: u32) -> Option<Vec2> {
    if let Some(boss) = &state.boss {
        if boss.id == target_id && !boss.removed {
            return Some(boss.pos);
        }
    }
    state
        .enemies
        .iter()
        .find(|e| e.id == target_id && !e.removed)
        .map(|e| e.pos)
}

/// Move all player shots: lifetime, homing steering, world-exit removal
pub(crate) fn update_player_shots(state: &mut WorldState, dt: f32) {
    let mut shots = std::mem::take(&mut state.player_shots);

    for shot in shots.iter_mut() {
        if shot.removed {
            continue;
        }

        if let ShotKind::Missile { target, lifetime } = &mut shot.kind {
            *lifetime -= dt;
            if *lifetime <= 0.0 {
                shot.removed = true;
                continue;
            }

            // Accelerate toward the speed cap
            let speed = shot.vel.length();
            let angle = shot.vel.y.atan2(shot.vel.x);
            let new_speed = (speed + MISSILE_ACCEL * dt).min(MISSILE_MAX_SPEED);

            // Steer toward the target, re-acquiring if it is gone
            let chase = match target.and_then(|id| target_pos(state, id)) {
                Some(p) => Some(p),
                None => {
                    *target = nearest_enemy_id(state, shot.pos);
                    target.and_then(|id| target_pos(state, id))
                }
            };
            let new_angle = match chase {
                Some(p) => {
                    let want = (p - shot.pos).y.atan2((p - shot.pos).x);
                    turn_toward(angle, want, MISSILE_TURN_RATE * dt)
                }
                // No target anywhere: keep flying straight
                None => angle,
            };
            shot.vel = angle_to_dir(new_angle) * new_speed;
        }

        shot.pos += shot.vel * dt;
        if out_of_world(shot.pos) {
            shot.removed = true;
        }
    }

    state.player_shots = shots;
}

/// Move all enemy shots; missiles home on the player
pub(crate) fn update_enemy_shots(state: &mut WorldState, dt: f32) {
    let player_pos = state.player.as_ref().map(|p| p.pos);

    for shot in state.enemy_shots.iter_mut() {
        if shot.removed {
            continue;
        }

        if let Some(life) = &mut shot.lifetime {
            *life -= dt;
            if *life <= 0.0 {
                shot.removed = true;
                continue;
            }
        }

        if shot.kind == EnemyShotKind::Missile {
            if let Some(target) = player_pos {
                let speed = shot.vel.length();
                let angle = shot.vel.y.atan2(shot.vel.x);
                let want = (target - shot.pos).y.atan2((target - shot.pos).x);
                let new_angle = turn_toward(angle, want, ENEMY_MISSILE_TURN_RATE * dt);
                shot.vel = angle_to_dir(new_angle) * speed;
            }
        }

        shot.pos += shot.vel * dt;
        if out_of_world(shot.pos) {
            shot.removed = true;
        }
    }
}
