//! Encounter director: the difficulty curve and everything it spawns
//!
//! Difficulty ramps linearly with elapsed time on top of a tier-dependent
//! base; the curve drives both spawn cadence and per-enemy stat scaling.
//! Regular spawning halts for good once a boss is summoned.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::boss::{ALL_BOSSES, Boss};
use super::enemy::{Enemy, EnemyKind};
use super::state::{GameEvent, WorldState};
use crate::consts::*;
use crate::{angle_to_dir, clamp_to_world};

/// Spawn-cadence and difficulty bookkeeping for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    /// Seconds of simulated run time
    pub elapsed: f32,
    /// Set once from the tier at run start
    pub base_difficulty: f32,
    /// Seconds since the last spawn batch
    spawn_timer: f32,
    /// Set when a boss is summoned or the run ends; never cleared
    halted: bool,
}

impl Director {
    pub fn new(base_difficulty: f32) -> Self {
        Self {
            elapsed: 0.0,
            base_difficulty,
            spawn_timer: 0.0,
            halted: false,
        }
    }

    /// `base × (1 + elapsed/60 × 0.5)`: +50% of base per minute
    pub fn difficulty(&self) -> f32 {
        self.base_difficulty * (1.0 + (self.elapsed / 60.0) * 0.5)
    }

    /// Seconds between spawn batches, floored so high difficulty cannot
    /// flood the arena
    pub fn spawn_interval(&self) -> f32 {
        (SPAWN_INTERVAL_BASE / self.difficulty().sqrt()).max(SPAWN_INTERVAL_MIN)
    }

    /// Enemies per batch, capped alongside the interval floor
    pub fn batch_size(&self) -> u32 {
        (self.difficulty() as u32).clamp(1, SPAWN_BATCH_MAX)
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn halted(&self) -> bool {
        self.halted
    }
}

/// (kind, weight at difficulty 1, weight once the shift saturates)
type SpawnTable = &'static [(EnemyKind, f32, f32)];

const TIER_1: SpawnTable = &[
    (EnemyKind::Slime, 0.50, 0.30),
    (EnemyKind::Lizard, 0.30, 0.25),
    (EnemyKind::Kamikaze, 0.20, 0.20),
    (EnemyKind::Golem, 0.00, 0.15),
    (EnemyKind::Totem, 0.00, 0.10),
];

const TIER_2: SpawnTable = &[
    (EnemyKind::Slime, 0.30, 0.15),
    (EnemyKind::Lizard, 0.25, 0.20),
    (EnemyKind::Kamikaze, 0.20, 0.15),
    (EnemyKind::Golem, 0.15, 0.20),
    (EnemyKind::Totem, 0.10, 0.10),
    (EnemyKind::MissileBot, 0.00, 0.20),
];

const TIER_3_PLUS: SpawnTable = &[
    (EnemyKind::Slime, 0.20, 0.10),
    (EnemyKind::Lizard, 0.20, 0.15),
    (EnemyKind::Kamikaze, 0.15, 0.15),
    (EnemyKind::Golem, 0.15, 0.15),
    (EnemyKind::Totem, 0.10, 0.10),
    (EnemyKind::MissileBot, 0.10, 0.15),
    (EnemyKind::BeamBot, 0.10, 0.20),
];

fn spawn_table(tier: u32) -> SpawnTable {
    match tier {
        1 => TIER_1,
        2 => TIER_2,
        _ => TIER_3_PLUS,
    }
}

/// Weighted draw from the tier table. Weights slide from their early to
/// their late values as `diff_factor = min(0.5, (difficulty − 1) × 0.1)`
/// saturates, shifting mass toward tougher kinds.
fn pick_kind(rng: &mut impl Rng, tier: u32, difficulty: f32) -> Option<EnemyKind> {
    let table = spawn_table(tier);
    debug_assert!(!table.is_empty(), "empty spawn table for tier {tier}");
    if table.is_empty() {
        return None;
    }

    let diff_factor = ((difficulty - 1.0) * 0.1).clamp(0.0, 0.5);
    let t = diff_factor * 2.0;
    let weight = |early: f32, late: f32| early + (late - early) * t;

    let total: f32 = table.iter().map(|&(_, e, l)| weight(e, l)).sum();
    let mut roll = rng.random_range(0.0..total);
    for &(kind, early, late) in table {
        roll -= weight(early, late);
        if roll <= 0.0 {
            return Some(kind);
        }
    }
    Some(table[table.len() - 1].0)
}

/// Advance the difficulty clock and spawn batches as the cadence allows.
/// Inert without a player, and permanently once halted.
pub(crate) fn advance_director(state: &mut WorldState, dt: f32) {
    if state.director.halted() {
        return;
    }
    let Some(player_pos) = state.player.as_ref().map(|p| p.pos) else {
        return;
    };

    state.director.elapsed += dt;
    state.director.spawn_timer += dt;

    let interval = state.director.spawn_interval();
    while state.director.spawn_timer >= interval {
        state.director.spawn_timer -= interval;
        let batch = state.director.batch_size();
        for _ in 0..batch {
            spawn_one(state, player_pos);
        }
    }
}

/// Place one scaled enemy in the ring band around the player
fn spawn_one(state: &mut WorldState, player_pos: Vec2) {
    let difficulty = state.director.difficulty();
    let Some(kind) = pick_kind(&mut state.rng, state.tier, difficulty) else {
        return;
    };

    let angle = state.rng.random_range(0.0..TAU);
    let dist = SPAWN_DIST_MIN + state.rng.random_range(0.0..SPAWN_DIST_BAND);
    let pos = clamp_to_world(player_pos + angle_to_dir(angle) * dist, kind.radius());

    let id = state.next_entity_id();
    let mut enemy = Enemy::new(id, kind, pos);

    // Stat scaling happens exactly once, at spawn
    let mult = difficulty * state.tier_multiplier();
    enemy.hp *= mult;
    enemy.max_hp *= mult;
    enemy.damage *= mult;

    state.enemies.push(enemy);
}

/// Altar-triggered boss summon. Halts regular spawning for the rest of
/// the run; a second trigger while a boss lives is a no-op.
pub(crate) fn summon_boss(state: &mut WorldState, origin: Vec2) {
    if state.boss.is_some() {
        return;
    }
    let Some(player_pos) = state.player.as_ref().map(|p| p.pos) else {
        return;
    };

    state.director.halt();

    let kind = ALL_BOSSES[state.rng.random_range(0..ALL_BOSSES.len())];
    let spawn_pos = clamp_to_world(player_pos + Vec2::new(0.0, -300.0), kind.radius());

    let id = state.next_entity_id();
    let mut boss = Boss::new(id, kind, spawn_pos);

    let mult = state.director.difficulty() * state.tier_multiplier();
    boss.hp *= mult;
    boss.max_hp *= mult;
    boss.damage *= mult;

    log::info!(
        "boss summoned: {} hp={:.0} at difficulty {:.2}",
        kind.name(),
        boss.max_hp,
        state.director.difficulty()
    );
    state.push_event(GameEvent::BossSummoned { kind: kind.name() });
    state.boss_origin = Some(origin);
    state.boss = Some(boss);
}
