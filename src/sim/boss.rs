//! Boss archetypes and their phase state machines
//!
//! Every boss alternates between `Chase` and one attack phase drawn from its
//! archetype catalog: when the phase timer passes the phase duration, a boss
//! in `Chase` rolls an attack phase (setup runs once on entry), and a boss in
//! any attack phase falls back to `Chase`. Two attack phases never run
//! back-to-back.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::combat::DamageOutcome;
use super::projectile::{EnemyShot, EnemyShotKind};
use super::state::{GameEvent, WorldState};
use crate::{angle_to_dir, clamp_to_world, normalize_angle};

/// Boss archetype (closed set, one picked per encounter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossKind {
    Overlord,
    SlimeKing,
    MechaGolem,
    VoidPhantom,
    CrimsonDragon,
}

pub const ALL_BOSSES: [BossKind; 5] = [
    BossKind::Overlord,
    BossKind::SlimeKing,
    BossKind::MechaGolem,
    BossKind::VoidPhantom,
    BossKind::CrimsonDragon,
];

impl BossKind {
    pub fn radius(&self) -> f32 {
        match self {
            Self::Overlord => 60.0,
            Self::SlimeKing => 80.0,
            Self::MechaGolem => 90.0,
            Self::VoidPhantom => 50.0,
            Self::CrimsonDragon => 100.0,
        }
    }

    pub fn speed(&self) -> f32 {
        match self {
            Self::SlimeKing => 60.0,
            _ => 80.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Overlord => "overlord",
            Self::SlimeKing => "slime_king",
            Self::MechaGolem => "mecha_golem",
            Self::VoidPhantom => "void_phantom",
            Self::CrimsonDragon => "crimson_dragon",
        }
    }

    /// How long the boss chases between attacks
    fn chase_duration(&self, rng: &mut impl Rng) -> f32 {
        match self {
            Self::Overlord => 2.0 + rng.random_range(0.0..2.0),
            Self::SlimeKing | Self::VoidPhantom => 2.0,
            Self::MechaGolem | Self::CrimsonDragon => 3.0,
        }
    }
}

/// One behaviour mode of a boss state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    Chase,
    // Overlord
    Barrage,
    Charge,
    Beam,
    // Slime King
    Leap,
    Summon,
    // Mecha Golem
    RocketVolley,
    Shield,
    // Void Phantom
    Blink,
    OrbRing,
    // Crimson Dragon
    FlameBreath,
    Meteor,
}

impl BossPhase {
    pub fn is_attack(&self) -> bool {
        *self != BossPhase::Chase
    }
}

const CHARGE_SPEED: f32 = 400.0;
const BEAM_RANGE: f32 = 600.0;
const BEAM_TOLERANCE: f32 = 0.2;
const BEAM_SWEEP_RATE: f32 = 0.5;
const LEAP_IMPACT_RADIUS: f32 = 150.0;

/// The boss actor. Base stats are scaled once by the director at summon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub id: u32,
    pub kind: BossKind,
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub damage: f32,
    pub removed: bool,
    pub phase: BossPhase,
    /// Seconds in the current phase; reset on every transition
    pub phase_timer: f32,
    /// Fixed at transition time
    pub phase_duration: f32,
    /// Charge / leap / blink destination
    pub target_point: Vec2,
    pub beam_angle: f32,
    pub beam_firing: bool,
    /// Barrage rings fired so far in this phase
    pub volley_count: u32,
    /// Leap / blink / flame-breath sub-timer (telegraph and cadence)
    pub aux_timer: f32,
    /// One-shot phase effects (leap impact, blink relocation)
    pub effect_done: bool,
}

impl Boss {
    pub fn new(id: u32, kind: BossKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            radius: kind.radius(),
            speed: kind.speed(),
            hp: 1000.0,
            max_hp: 1000.0,
            damage: 15.0,
            removed: false,
            phase: BossPhase::Chase,
            phase_timer: 0.0,
            phase_duration: 5.0,
            target_point: Vec2::ZERO,
            beam_angle: 0.0,
            beam_firing: false,
            volley_count: 0,
            aux_timer: 0.0,
            effect_done: false,
        }
    }

    /// Damage-immunity policy hook, queried by the combat pipeline before
    /// any health reduction. A shielded boss blocks everything.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.phase == BossPhase::Shield {
            return DamageOutcome::Blocked;
        }
        self.hp -= amount;
        DamageOutcome::Applied
    }

    fn chase(&mut self, target: Vec2, dt: f32) {
        let delta = target - self.pos;
        let dist = delta.length();
        if dist > 0.0 {
            self.pos += delta / dist * self.speed * dt;
        }
    }

    /// Attack catalog draw for this archetype (called from `Chase` only)
    fn roll_attack(&self, rng: &mut impl Rng) -> BossPhase {
        let roll: f32 = rng.random_range(0.0..1.0);
        match self.kind {
            BossKind::Overlord => {
                if roll < 0.4 {
                    BossPhase::Barrage
                } else if roll < 0.7 {
                    BossPhase::Charge
                } else {
                    BossPhase::Beam
                }
            }
            BossKind::SlimeKing => {
                if roll < 0.6 {
                    BossPhase::Leap
                } else {
                    BossPhase::Summon
                }
            }
            BossKind::MechaGolem => {
                if roll < 0.5 {
                    BossPhase::RocketVolley
                } else {
                    BossPhase::Shield
                }
            }
            BossKind::VoidPhantom => {
                if roll < 0.5 {
                    BossPhase::Blink
                } else {
                    BossPhase::OrbRing
                }
            }
            BossKind::CrimsonDragon => {
                if roll < 0.5 {
                    BossPhase::FlameBreath
                } else {
                    BossPhase::Meteor
                }
            }
        }
    }
}

/// Aim/speed/radius/damage for a shot queued during a boss phase
struct ShotRequest {
    aim: f32,
    speed: f32,
    radius: f32,
    damage: f32,
}

/// Phase entry: set duration, reset transient fields, run one-shot setup
/// effects (volley emission, target selection, shield heal).
fn enter_phase(
    boss: &mut Boss,
    phase: BossPhase,
    player_pos: Vec2,
    rng: &mut impl Rng,
    shots: &mut Vec<ShotRequest>,
) {
    boss.phase = phase;
    boss.phase_timer = 0.0;
    boss.aux_timer = 0.0;
    boss.effect_done = false;
    boss.volley_count = 0;
    boss.beam_firing = false;

    let to_player = player_pos - boss.pos;
    let aim_at_player = to_player.y.atan2(to_player.x);

    match phase {
        BossPhase::Chase => {
            boss.phase_duration = boss.kind.chase_duration(rng);
        }
        BossPhase::Barrage => {
            boss.phase_duration = 3.0;
        }
        BossPhase::Charge => {
            boss.phase_duration = 2.0;
            // Dash through the player toward a far point
            boss.target_point = boss.pos + angle_to_dir(aim_at_player) * 1000.0;
        }
        BossPhase::Beam => {
            boss.phase_duration = 4.0;
            boss.beam_angle = aim_at_player;
        }
        BossPhase::Leap => {
            boss.phase_duration = 2.0;
            boss.target_point = player_pos;
        }
        BossPhase::Summon => {
            boss.phase_duration = 1.0;
            for _ in 0..3 {
                shots.push(ShotRequest {
                    aim: rng.random_range(0.0..TAU),
                    speed: 200.0,
                    radius: 10.0,
                    damage: boss.damage,
                });
            }
        }
        BossPhase::RocketVolley => {
            boss.phase_duration = 2.0;
            for i in -1..=1 {
                shots.push(ShotRequest {
                    aim: aim_at_player + i as f32 * 0.3,
                    speed: 200.0,
                    radius: 20.0,
                    damage: boss.damage * 1.5,
                });
            }
        }
        BossPhase::Shield => {
            boss.phase_duration = 4.0;
            boss.hp = (boss.hp + 10.0).min(boss.max_hp);
        }
        BossPhase::Blink => {
            boss.phase_duration = 1.5;
            let angle = rng.random_range(0.0..TAU);
            boss.target_point = clamp_to_world(player_pos + angle_to_dir(angle) * 200.0, 50.0);
        }
        BossPhase::OrbRing => {
            boss.phase_duration = 2.0;
            for i in 0..8 {
                shots.push(ShotRequest {
                    aim: TAU / 8.0 * i as f32,
                    speed: 200.0,
                    radius: 6.0,
                    damage: boss.damage,
                });
            }
        }
        BossPhase::FlameBreath => {
            boss.phase_duration = 2.0;
        }
        BossPhase::Meteor => {
            boss.phase_duration = 1.0;
            shots.push(ShotRequest {
                aim: aim_at_player,
                speed: 400.0,
                radius: 30.0,
                damage: boss.damage * 2.0,
            });
        }
    }
}

/// Advance the boss one tick: phase transition check, then the sustained
/// behaviour of the current phase. Continuous damage (beam, leap impact)
/// is applied to the player here; shot emission goes through the world.
pub(crate) fn update_boss(state: &mut WorldState, dt: f32) {
    let Some(mut boss) = state.boss.take() else {
        return;
    };
    let Some(player_pos) = state.player.as_ref().map(|p| p.pos) else {
        // No player yet: boss idles, timers frozen
        state.boss = Some(boss);
        return;
    };

    let mut shots: Vec<ShotRequest> = Vec::new();
    let mut player_damage = 0.0;

    boss.phase_timer += dt;

    // Transition once per tick: chase rolls an attack, attacks fall back
    if boss.phase_timer >= boss.phase_duration {
        let next = if boss.phase == BossPhase::Chase {
            boss.roll_attack(&mut state.rng)
        } else {
            BossPhase::Chase
        };
        enter_phase(&mut boss, next, player_pos, &mut state.rng, &mut shots);
    }

    match boss.phase {
        BossPhase::Chase => boss.chase(player_pos, dt),
        BossPhase::Barrage => {
            // Slow advance while emitting rotating 12-shot rings
            boss.chase(player_pos, dt * 0.2);
            if boss.phase_timer > boss.volley_count as f32 * 0.2 {
                boss.volley_count += 1;
                let offset = boss.volley_count as f32 * 0.2;
                for i in 0..12 {
                    shots.push(ShotRequest {
                        aim: TAU / 12.0 * i as f32 + offset,
                        speed: 250.0,
                        radius: 6.0,
                        damage: boss.damage,
                    });
                }
            }
        }
        BossPhase::Charge => {
            let delta = boss.target_point - boss.pos;
            let dist = delta.length();
            if dist > 10.0 {
                boss.pos += delta / dist * CHARGE_SPEED * dt;
            } else {
                // Arrived early: let the transition fire next tick
                boss.phase_timer = boss.phase_duration;
            }
        }
        BossPhase::Beam => {
            if boss.phase_timer < 1.0 {
                // Aim lock-on during the charge-up second
                let to_player = player_pos - boss.pos;
                boss.beam_angle = to_player.y.atan2(to_player.x);
                boss.beam_firing = false;
            } else {
                boss.beam_firing = true;
                boss.beam_angle = normalize_angle(boss.beam_angle + BEAM_SWEEP_RATE * dt);
                let to_player = player_pos - boss.pos;
                if to_player.length() < BEAM_RANGE {
                    let aim_to_player = to_player.y.atan2(to_player.x);
                    let diff = normalize_angle(aim_to_player - boss.beam_angle);
                    if diff.abs() < BEAM_TOLERANCE {
                        player_damage += boss.damage * 2.0 * dt;
                    }
                }
            }
        }
        BossPhase::Leap => {
            boss.aux_timer += dt;
            // Airborne telegraph for 1s, then impact at the recorded point
            if boss.aux_timer >= 1.0 && !boss.effect_done {
                boss.effect_done = true;
                boss.pos = boss.target_point;
                if player_pos.distance(boss.pos) < LEAP_IMPACT_RADIUS {
                    player_damage += boss.damage;
                }
            }
        }
        BossPhase::Blink => {
            boss.aux_timer += dt;
            // Portal telegraph, then relocation; the fade-in that follows
            // is cosmetic and carries no hitbox change
            if boss.aux_timer >= 1.0 && !boss.effect_done {
                boss.effect_done = true;
                boss.pos = boss.target_point;
            }
        }
        BossPhase::FlameBreath => {
            boss.aux_timer += dt;
            while boss.aux_timer >= 0.1 {
                boss.aux_timer -= 0.1;
                let to_player = player_pos - boss.pos;
                let aim = to_player.y.atan2(to_player.x) + state.rng.random_range(-0.25..0.25);
                shots.push(ShotRequest {
                    aim,
                    speed: 200.0,
                    radius: 12.0,
                    damage: boss.damage,
                });
            }
        }
        // Setup-only phases: the boss holds position until the timer expires
        BossPhase::Summon
        | BossPhase::RocketVolley
        | BossPhase::Shield
        | BossPhase::OrbRing
        | BossPhase::Meteor => {}
    }

    boss.pos = clamp_to_world(boss.pos, boss.radius);

    let origin = boss.pos;
    for req in shots {
        let id = state.next_entity_id();
        state.enemy_shots.push(EnemyShot::new(
            id,
            origin,
            req.aim,
            req.speed,
            req.radius,
            req.damage,
            EnemyShotKind::Straight,
        ));
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

    state.boss = Some(boss);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Loadout;

    fn world_with_boss(kind: BossKind) -> WorldState {
        let mut state = WorldState::new(7, 1, &Loadout::default());
        let id = state.next_entity_id();
        state.boss = Some(Boss::new(id, kind, Vec2::new(1000.0, 700.0)));
        state
    }

    /// Force the next transition and return the phase entered
    fn force_transition(state: &mut WorldState) -> BossPhase {
        let duration = state.boss.as_ref().unwrap().phase_duration;
        state.boss.as_mut().unwrap().phase_timer = duration;
        update_boss(state, 0.016);
        state.boss.as_ref().unwrap().phase
    }

    #[test]
    fn test_chase_attack_alternation() {
        let mut state = world_with_boss(BossKind::Overlord);
        let mut prev_was_attack = false;
        for _ in 0..40 {
            let phase = force_transition(&mut state);
            if prev_was_attack {
                assert_eq!(phase, BossPhase::Chase, "attack phases must not repeat");
            }
            prev_was_attack = phase.is_attack();
        }
    }

    #[test]
    fn test_phase_timer_never_exceeds_duration_plus_tick() {
        let mut state = world_with_boss(BossKind::SlimeKing);
        let dt = 0.05;
        for _ in 0..2000 {
            update_boss(&mut state, dt);
            let boss = state.boss.as_ref().unwrap();
            assert!(boss.phase_timer <= boss.phase_duration + dt + 1e-5);
        }
    }

    /// Put the boss straight into a phase, sidestepping the weighted draw
    fn set_phase(state: &mut WorldState, phase: BossPhase, player_pos: Vec2) {
        let mut boss = state.boss.take().unwrap();
        let mut shots = Vec::new();
        enter_phase(&mut boss, phase, player_pos, &mut state.rng, &mut shots);
        state.boss = Some(boss);
    }

    #[test]
    fn test_shield_phase_blocks_damage() {
        let mut state = world_with_boss(BossKind::MechaGolem);
        set_phase(&mut state, BossPhase::Shield, Vec2::new(1000.0, 1000.0));
        let boss = state.boss.as_mut().unwrap();
        let hp = boss.hp;

        assert_eq!(boss.take_damage(99999.0), DamageOutcome::Blocked);
        assert_eq!(boss.hp, hp);

        // One tick after the phase ends, damage lands in full
        boss.phase_timer = boss.phase_duration;
        update_boss(&mut state, 0.016);
        let boss = state.boss.as_mut().unwrap();
        assert_eq!(boss.phase, BossPhase::Chase);
        let hp = boss.hp;
        assert_eq!(boss.take_damage(50.0), DamageOutcome::Applied);
        assert!((boss.hp - (hp - 50.0)).abs() < 1e-3);
    }

    #[test]
    fn test_orb_ring_emits_eight_shots() {
        let mut state = world_with_boss(BossKind::VoidPhantom);
        // Drive transitions until the orb ring comes up
        for _ in 0..60 {
            let phase = force_transition(&mut state);
            if phase == BossPhase::OrbRing {
                assert_eq!(state.enemy_shots.len() % 8, 0);
                assert!(!state.enemy_shots.is_empty());
                return;
            }
            state.enemy_shots.clear();
        }
        panic!("orb ring never selected in 60 transitions");
    }

    #[test]
    fn test_blink_relocates_after_telegraph() {
        let mut state = world_with_boss(BossKind::VoidPhantom);
        set_phase(&mut state, BossPhase::Blink, Vec2::new(1000.0, 1000.0));
        let boss = state.boss.as_ref().unwrap();
        let telegraphed = boss.target_point;
        let before = boss.pos;

        update_boss(&mut state, 0.5);
        assert_eq!(state.boss.as_ref().unwrap().pos, before, "still telegraphing");

        update_boss(&mut state, 0.6);
        let pos = state.boss.as_ref().unwrap().pos;
        assert!(pos.distance(telegraphed) < 1.0);
    }

    #[test]
    fn test_leap_impact_damages_nearby_player_once() {
        let mut state = world_with_boss(BossKind::SlimeKing);
        let player_pos = state.player.as_ref().unwrap().pos;
        set_phase(&mut state, BossPhase::Leap, player_pos);
        let hp_before = state.player.as_ref().unwrap().hp;

        update_boss(&mut state, 1.05);
        let hp_after_impact = state.player.as_ref().unwrap().hp;
        assert!(hp_after_impact < hp_before);

        // Later ticks in the same phase deal no further impact damage
        update_boss(&mut state, 0.2);
        assert_eq!(state.player.as_ref().unwrap().hp, hp_after_impact);
    }

    #[test]
    fn test_charge_ends_early_at_target() {
        let mut state = world_with_boss(BossKind::Overlord);
        set_phase(&mut state, BossPhase::Charge, Vec2::new(1000.0, 1000.0));
        let boss = state.boss.as_mut().unwrap();
        boss.pos = boss.target_point + Vec2::new(5.0, 0.0);

        update_boss(&mut state, 0.016);
        let boss = state.boss.as_ref().unwrap();
        assert!(boss.phase_timer >= boss.phase_duration);
    }
}
