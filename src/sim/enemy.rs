//! Enemy kinds, stat tables, and per-kind behaviour
//!
//! Enemy variants form a small closed set; per-kind data lives in the stat
//! table below and behaviour dispatches on the kind tag. Bosses are a
//! separate specialization in `boss.rs`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::projectile::{EnemyShot, EnemyShotKind};
use super::state::{GameEvent, WorldState};
use crate::normalize_angle;

/// The closed enemy-type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Slime,
    Lizard,
    Golem,
    Totem,
    Kamikaze,
    MissileBot,
    BeamBot,
}

impl EnemyKind {
    pub fn base_hp(&self) -> f32 {
        match self {
            Self::Slime => 20.0,
            Self::Lizard => 30.0,
            Self::Golem => 100.0,
            Self::Totem => 50.0,
            Self::Kamikaze => 15.0,
            Self::MissileBot => 40.0,
            Self::BeamBot => 60.0,
        }
    }

    pub fn speed(&self) -> f32 {
        match self {
            Self::Slime => 80.0,
            Self::Lizard => 100.0,
            Self::Golem => 40.0,
            Self::Totem => 0.0, // stationary
            Self::Kamikaze => 180.0,
            Self::MissileBot => 60.0,
            Self::BeamBot => 30.0,
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            Self::Slime | Self::Lizard => 15.0,
            Self::Golem => 25.0,
            Self::Totem => 20.0,
            Self::Kamikaze => 12.0,
            Self::MissileBot => 20.0,
            Self::BeamBot => 25.0,
        }
    }

    pub fn base_damage(&self) -> f32 {
        match self {
            Self::Golem => 10.0,
            Self::Kamikaze => 20.0,
            _ => 5.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Slime => "slime",
            Self::Lizard => "lizard",
            Self::Golem => "golem",
            Self::Totem => "totem",
            Self::Kamikaze => "kamikaze",
            Self::MissileBot => "missile_bot",
            Self::BeamBot => "beam_bot",
        }
    }
}

/// Totem blast: radius and cadence
const TOTEM_BLAST_RADIUS: f32 = 150.0;
const TOTEM_BLAST_INTERVAL: f32 = 3.0;
const TOTEM_BLAST_DURATION: f32 = 0.5;

/// Beam bot: charge, fire window, reach and angular tolerance
const BEAM_CHARGE_DURATION: f32 = 2.0;
const BEAM_FIRE_DURATION: f32 = 1.0;
const BEAM_RANGE: f32 = 400.0;
const BEAM_TOLERANCE: f32 = 0.15;

/// A hostile actor created by the director
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub hp: f32,
    pub max_hp: f32,
    /// Absorption pool consumed before health; zero for every base kind,
    /// nonzero only through elite modifiers
    pub shield: f32,
    pub damage: f32,
    pub removed: bool,
    /// Ranged kinds: time since last shot. Totem: time since last blast.
    pub attack_timer: f32,
    /// Totem / beam bot: remaining active window bookkeeping
    pub fire_timer: f32,
    pub firing: bool,
    /// Beam bot aim, locked when firing starts
    pub beam_angle: f32,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            radius: kind.radius(),
            speed: kind.speed(),
            hp: kind.base_hp(),
            max_hp: kind.base_hp(),
            shield: 0.0,
            damage: kind.base_damage(),
            removed: false,
            attack_timer: 0.0,
            fire_timer: 0.0,
            firing: false,
            beam_angle: 0.0,
        }
    }

    fn chase(&mut self, target: Vec2, dt: f32) {
        let delta = target - self.pos;
        let dist = delta.length();
        if dist > 0.0 {
            self.pos += delta / dist * self.speed * dt;
        }
    }
}

/// Advance every regular enemy: movement, shot emission, and continuous
/// blast/beam damage against the player. Contact damage is resolved later
/// by the combat pass.
pub(crate) fn update_enemies(state: &mut WorldState, dt: f32) {
    let Some(player_pos) = state.player.as_ref().map(|p| p.pos) else {
        return;
    };

    // (origin, aim angle, speed, radius, damage, kind) materialized after
    // the loop so id allocation stays out of the iteration
    let mut shot_requests: Vec<(Vec2, f32, f32, f32, f32, EnemyShotKind)> = Vec::new();
    let mut player_damage = 0.0;

    for enemy in state.enemies.iter_mut() {
        if enemy.removed {
            continue;
        }
        let to_player = player_pos - enemy.pos;
        let dist = to_player.length();

        match enemy.kind {
            EnemyKind::Slime | EnemyKind::Golem | EnemyKind::Kamikaze => {
                enemy.chase(player_pos, dt);
            }
            EnemyKind::Lizard => {
                enemy.chase(player_pos, dt);
                enemy.attack_timer += dt;
                if enemy.attack_timer >= 2.0 {
                    enemy.attack_timer = 0.0;
                    let aim = to_player.y.atan2(to_player.x);
                    shot_requests.push((
                        enemy.pos,
                        aim,
                        200.0,
                        6.0,
                        enemy.damage,
                        EnemyShotKind::Straight,
                    ));
                }
            }
            EnemyKind::MissileBot => {
                enemy.chase(player_pos, dt);
                enemy.attack_timer += dt;
                if enemy.attack_timer >= 3.0 {
                    enemy.attack_timer = 0.0;
                    let aim = to_player.y.atan2(to_player.x);
                    shot_requests.push((
                        enemy.pos,
                        aim,
                        250.0,
                        6.0,
                        enemy.damage,
                        EnemyShotKind::Missile,
                    ));
                }
            }
            EnemyKind::Totem => {
                if enemy.firing {
                    enemy.fire_timer += dt;
                    if enemy.fire_timer > TOTEM_BLAST_DURATION {
                        enemy.firing = false;
                        enemy.fire_timer = 0.0;
                    } else if dist < TOTEM_BLAST_RADIUS {
                        player_damage += enemy.damage * 2.0 * dt;
                    }
                } else {
                    enemy.attack_timer += dt;
                    if enemy.attack_timer > TOTEM_BLAST_INTERVAL {
                        enemy.attack_timer = 0.0;
                        enemy.firing = true;
                    }
                }
            }
            EnemyKind::BeamBot => {
                if enemy.firing {
                    enemy.fire_timer += dt;
                    if enemy.fire_timer > BEAM_FIRE_DURATION {
                        enemy.firing = false;
                        enemy.fire_timer = 0.0;
                    } else if dist < BEAM_RANGE {
                        let aim_to_player = to_player.y.atan2(to_player.x);
                        let diff = normalize_angle(aim_to_player - enemy.beam_angle);
                        if diff.abs() < BEAM_TOLERANCE {
                            player_damage += enemy.damage * 2.0 * dt;
                        }
                    }
                } else {
                    // Keep tracking the player until the beam locks
                    enemy.beam_angle = to_player.y.atan2(to_player.x);
                    enemy.fire_timer += dt;
                    if enemy.fire_timer <= BEAM_CHARGE_DURATION / 2.0 {
                        enemy.chase(player_pos, dt);
                    }
                    if enemy.fire_timer > BEAM_CHARGE_DURATION {
                        enemy.firing = true;
                        enemy.fire_timer = 0.0;
                    }
                }
            }
        }
    }

    for (origin, aim, speed, radius, damage, kind) in shot_requests {
        let id = state.next_entity_id();
        let jitter = match kind {
            // Missiles launch with a small random spread before homing in
            EnemyShotKind::Missile => state.rng.random_range(-0.5..0.5),
            EnemyShotKind::Straight => 0.0,
        };
        state
            .enemy_shots
            .push(EnemyShot::new(id, origin, aim + jitter, speed, radius, damage, kind));
    }

    if player_damage > 0.0 {
        if let Some(player) = state.player.as_mut() {
            let (absorbed, taken) = player.absorb_damage(player_damage);
            if absorbed > 0.0 {
                state.events.push(GameEvent::ShieldAbsorbed { amount: absorbed });
            }
            if taken > 0.0 {
                state.events.push(GameEvent::PlayerHit { damage: taken });
            }
        }
    }
}
