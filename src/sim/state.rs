//! World state and core simulation types
//!
//! Everything that must survive a tick lives here. The state is fully
//! serializable and, together with a fixed input/dt sequence, replayable.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::TAU;

use super::boss::Boss;
use super::director::Director;
use super::enemy::Enemy;
use super::projectile::{EnemyShot, Shot};
use crate::consts::*;
use crate::{angle_to_dir, clamp_to_world};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndCause {
    PlayerDied,
    StageCleared,
}

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Simulation advancing normally
    Running,
    /// Run over; collections stay intact for the stats readout
    Ended(EndCause),
}

/// One-way notifications for the host (audio/visual/UI collaborators).
/// Accumulated during a tick, drained by the host afterwards. Not part of
/// the persistent state (the outbox is skipped on serialization).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    ShotFired,
    EnemyHit { id: u32, damage: f32, crit: bool },
    DamageBlocked { id: u32 },
    EnemyKilled { id: u32, kind: &'static str },
    PlayerHit { damage: f32 },
    ShieldAbsorbed { amount: f32 },
    DropCollected { value: u32 },
    /// Reward selection is a host flow; the core only reports the opening
    ChestOpened { id: u32 },
    BossSummoned { kind: &'static str },
    EncounterCleared,
    PlayerDied,
}

/// Permanent-upgrade deltas, read once at run start. The persistence
/// collaborator owns where these come from; the core never writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loadout {
    pub bonus_damage: f32,
    pub bonus_max_hp: f32,
    pub bonus_speed: f32,
    /// Subtracted from the base shoot interval (floored at 0.1s)
    pub fire_rate_bonus: f32,
    /// Total shots per volley (1 = single shot)
    pub multi_shot: u32,
    /// Piercing shots fired alongside each volley
    pub pierce_shots: u32,
    /// Homing missiles fired per burst
    pub missile_count: u32,
    /// Orbiting companion drones
    pub drone_count: u32,
    /// Chance in [0,1] that a shot is critical (rolled at creation)
    pub crit_chance: f32,
    pub hp_regen: f32,
    pub max_shield: f32,
    /// Multiplier on damage the player takes (armor upgrades push it below 1)
    pub damage_taken_mult: f32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            bonus_damage: 0.0,
            bonus_max_hp: 0.0,
            bonus_speed: 0.0,
            fire_rate_bonus: 0.0,
            multi_shot: 1,
            pierce_shots: 0,
            missile_count: 0,
            drone_count: 0,
            crit_chance: 0.0,
            hp_regen: 0.0,
            max_shield: 0.0,
            damage_taken_mult: 1.0,
        }
    }
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub shoot_interval: f32,
    pub shoot_timer: f32,
    pub shield: f32,
    pub max_shield: f32,
    /// Seconds since the player was last hit (gates shield regen)
    pub shield_regen_timer: f32,
    pub hp_regen: f32,
    pub damage_taken_mult: f32,
    pub crit_chance: f32,
    pub multi_shot: u32,
    pub pierce_shots: u32,
    pub missile_count: u32,
    /// Missiles still owed from the current burst, released one per 0.1s
    pub missile_queue: u32,
    pub missile_burst_timer: f32,
}

impl Player {
    pub fn new(pos: Vec2, loadout: &Loadout) -> Self {
        let max_hp = PLAYER_MAX_HP + loadout.bonus_max_hp;
        Self {
            pos,
            radius: PLAYER_RADIUS,
            hp: max_hp,
            max_hp,
            speed: PLAYER_SPEED + loadout.bonus_speed,
            damage: PLAYER_DAMAGE + loadout.bonus_damage,
            shoot_interval: (PLAYER_SHOOT_INTERVAL - loadout.fire_rate_bonus).max(0.1),
            shoot_timer: 0.0,
            shield: loadout.max_shield,
            max_shield: loadout.max_shield,
            shield_regen_timer: 0.0,
            hp_regen: loadout.hp_regen,
            damage_taken_mult: loadout.damage_taken_mult,
            crit_chance: loadout.crit_chance,
            multi_shot: loadout.multi_shot.max(1),
            pierce_shots: loadout.pierce_shots,
            missile_count: loadout.missile_count,
            missile_queue: 0,
            missile_burst_timer: 0.0,
        }
    }

    /// Apply incoming damage through the shield pool. Returns
    /// (absorbed, taken); resets the shield regen gate either way.
    pub fn absorb_damage(&mut self, raw: f32) -> (f32, f32) {
        let scaled = raw * self.damage_taken_mult;
        let absorbed = scaled.min(self.shield);
        self.shield -= absorbed;
        let taken = scaled - absorbed;
        self.hp -= taken;
        self.shield_regen_timer = 0.0;
        (absorbed, taken)
    }
}

/// What a drop credits on pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropKind {
    Energy,
    Currency,
}

/// A world pickup generated on enemy death
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drop {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub kind: DropKind,
    pub value: u32,
    pub removed: bool,
}

impl Drop {
    pub fn new(id: u32, pos: Vec2, kind: DropKind, value: u32) -> Self {
        Self {
            id,
            pos,
            radius: DROP_RADIUS,
            kind,
            value,
            removed: false,
        }
    }
}

/// One-shot reward cache; opening hands control to the host reward flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chest {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub removed: bool,
}

/// Orbiting companion granted by the loadout; fires at nearby enemies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
    pub pos: Vec2,
    pub angle: f32,
    pub shoot_timer: f32,
}

/// Static circular obstacle; push-out only, never damaged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Vec2,
    pub radius: f32,
}

/// World marker that summons the boss on player contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossAltar {
    pub pos: Vec2,
    pub radius: f32,
}

/// Run totals, read by the stats collaborator after the run ends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub energy_collected: u64,
    pub currency_collected: u64,
    pub kills: BTreeMap<String, u32>,
}

impl RunStats {
    pub fn record_kill(&mut self, kind: &str) {
        *self.kills.entry(kind.to_string()).or_insert(0) += 1;
    }
}

/// Complete world state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Seeded RNG; every random decision in the core draws from it
    pub rng: Pcg32,
    pub phase: RunPhase,
    /// Progression tier (1-based); scales stats and selects the spawn table
    pub tier: u32,
    pub player: Option<Player>,
    pub director: Director,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub player_shots: Vec<Shot>,
    pub enemy_shots: Vec<EnemyShot>,
    pub drops: Vec<Drop>,
    pub chests: Vec<Chest>,
    pub drones: Vec<Drone>,
    pub obstacles: Vec<Obstacle>,
    pub altar: Option<BossAltar>,
    /// Where the boss encounter originated; the external altar collaborator
    /// places the follow-up marker here after the boss falls
    pub boss_origin: Option<Vec2>,
    pub stats: RunStats,
    /// Outbox drained by the host after each tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl WorldState {
    /// Create a new run. Obstacles and the boss altar are scattered here;
    /// regular enemies arrive through the director.
    pub fn new(seed: u64, tier: u32, loadout: &Loadout) -> Self {
        let tier = tier.max(1);
        let mut rng = Pcg32::seed_from_u64(seed);
        let start = Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0);

        // Static obstacles, never within 200px of the player start
        let mut obstacles = Vec::new();
        let obstacle_count = 15 + tier * 5;
        for _ in 0..obstacle_count {
            let pos = Vec2::new(
                rng.random_range(0.0..WORLD_WIDTH),
                rng.random_range(0.0..WORLD_HEIGHT),
            );
            if pos.distance(start) > 200.0 {
                obstacles.push(Obstacle {
                    pos,
                    radius: rng.random_range(20.0..45.0),
                });
            }
        }

        // Boss altar far from the player, clamped inside the world
        let angle = rng.random_range(0.0..TAU);
        let altar_pos = clamp_to_world(start + angle_to_dir(angle) * ALTAR_DIST, 100.0);

        let base_difficulty = 1.0 + (tier as f32 - 1.0) * 0.08;

        // Companion drones start evenly spread on the orbit
        let drone_count = loadout.drone_count;
        let drones = (0..drone_count)
            .map(|i| Drone {
                pos: start,
                angle: TAU * i as f32 / drone_count.max(1) as f32,
                shoot_timer: 0.0,
            })
            .collect();

        log::info!("run start: seed={seed} tier={tier} base_difficulty={base_difficulty:.2}");

        let mut state = Self {
            seed,
            rng,
            phase: RunPhase::Running,
            tier,
            player: Some(Player::new(start, loadout)),
            director: Director::new(base_difficulty),
            enemies: Vec::new(),
            boss: None,
            player_shots: Vec::new(),
            enemy_shots: Vec::new(),
            drops: Vec::new(),
            chests: Vec::new(),
            drones,
            obstacles,
            altar: Some(BossAltar {
                pos: altar_pos,
                radius: ALTAR_RADIUS,
            }),
            boss_origin: None,
            stats: RunStats::default(),
            events: Vec::new(),
            next_id: 1,
        };

        // Reward chests scattered across the arena, clear of the start
        for _ in 0..CHEST_COUNT {
            let pos = Vec2::new(
                state.rng.random_range(50.0..WORLD_WIDTH - 50.0),
                state.rng.random_range(50.0..WORLD_HEIGHT - 50.0),
            );
            if pos.distance(start) > 200.0 {
                let id = state.next_entity_id();
                state.chests.push(Chest {
                    id,
                    pos,
                    radius: CHEST_RADIUS,
                    removed: false,
                });
            }
        }

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand the accumulated events to the host
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Stat multiplier applied once to every spawned enemy and boss
    pub fn tier_multiplier(&self) -> f32 {
        1.0 + (self.tier as f32 - 1.0) * 0.15
    }

    /// End the run: the director halts, collections stay intact so the
    /// stats collaborator can read them before the host resets.
    pub fn end_run(&mut self, cause: EndCause) {
        if self.phase == RunPhase::Running {
            self.phase = RunPhase::Ended(cause);
            self.director.halt();
            log::info!("run ended: {cause:?}");
        }
    }

    /// Physically purge everything flagged for removal this tick.
    /// Runs exactly once, at the end of the tick, so in-flight iteration
    /// never observes a shrinking collection.
    pub fn purge_removed(&mut self) {
        self.enemies.retain(|e| !e.removed);
        self.player_shots.retain(|s| !s.removed);
        self.enemy_shots.retain(|s| !s.removed);
        self.drops.retain(|d| !d.removed);
        self.chests.retain(|c| !c.removed);
        if self.boss.as_ref().is_some_and(|b| b.removed) {
            self.boss = None;
        }
    }
}
