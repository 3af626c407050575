//! The per-frame update entry point
//!
//! One call advances the whole world by `dt` seconds in a fixed order:
//! director, player, enemies, boss, projectiles, combat resolution, altar
//! trigger, end-of-run checks, and finally the removal purge. The same
//! seed and input sequence always replays to the same state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boss::update_boss;
use super::combat::resolve_combat;
use super::director::{advance_director, summon_boss};
use super::enemy::update_enemies;
use super::projectile::{Shot, update_enemy_shots, update_player_shots};
use super::state::{EndCause, GameEvent, RunPhase, WorldState};
use crate::{angle_to_dir, clamp_to_world, normalize_angle};

/// Shot spread between barrels of a multi-shot volley
const VOLLEY_SPREAD: f32 = 0.15;
/// Piercing side-shots trade damage for reach
const PIERCE_DAMAGE_MULT: f32 = 0.8;
/// Missiles are plentiful, so each carries half a shot's damage
const MISSILE_DAMAGE_MULT: f32 = 0.5;
/// Seconds between missiles of one burst
const MISSILE_BURST_GAP: f32 = 0.1;

/// Drone companion tuning
const DRONE_ORBIT_DIST: f32 = 60.0;
const DRONE_ORBIT_RATE: f32 = 2.0;
const DRONE_RANGE: f32 = 300.0;
const DRONE_DAMAGE: f32 = 10.0;
const DRONE_SHOOT_INTERVAL: f32 = 1.0;

/// Host-supplied input for one tick
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickInput {
    /// Desired movement direction; longer-than-unit vectors are normalized
    pub move_dir: Vec2,
}

/// Advance the simulation one step. A no-op once the run has ended.
pub fn tick(state: &mut WorldState, input: &TickInput, dt: f32) {
    if state.phase != RunPhase::Running {
        return;
    }

    advance_director(state, dt);
    update_player(state, input, dt);
    update_drones(state, dt);
    update_enemies(state, dt);
    update_boss(state, dt);
    update_player_shots(state, dt);
    update_enemy_shots(state, dt);
    resolve_combat(state, dt);
    check_altar(state);
    check_chests(state);
    check_run_end(state);
    state.purge_removed();
}

/// Movement, regeneration, and the auto-fire weapon loop
fn update_player(state: &mut WorldState, input: &TickInput, dt: f32) {
    let Some(mut player) = state.player.take() else {
        return;
    };

    let dir = if input.move_dir.length_squared() > 1.0 {
        input.move_dir.normalize()
    } else {
        input.move_dir
    };
    player.pos = clamp_to_world(player.pos + dir * player.speed * dt, player.radius);

    if player.hp_regen > 0.0 {
        player.hp = (player.hp + player.hp_regen * dt).min(player.max_hp);
    }
    player.shield_regen_timer += dt;
    if player.shield_regen_timer >= crate::consts::SHIELD_REGEN_DELAY {
        player.shield =
            (player.shield + crate::consts::SHIELD_REGEN_RATE * dt).min(player.max_shield);
    }

    // Weapons only cycle while something is on the field
    let target = nearest_target(state, player.pos);

    player.shoot_timer += dt;
    if player.shoot_timer >= player.shoot_interval {
        if let Some(target_pos) = target {
            player.shoot_timer = 0.0;
            fire_volley(state, &mut player, target_pos);
            if player.missile_count > 0 {
                player.missile_queue += player.missile_count;
            }
        }
    }

    if player.missile_queue > 0 {
        player.missile_burst_timer += dt;
        while player.missile_burst_timer >= MISSILE_BURST_GAP && player.missile_queue > 0 {
            player.missile_burst_timer -= MISSILE_BURST_GAP;
            player.missile_queue -= 1;
            fire_missile(state, &mut player);
        }
    } else {
        player.missile_burst_timer = 0.0;
    }

    state.player = Some(player);
}

fn nearest_target(state: &WorldState, pos: Vec2) -> Option<Vec2> {
    let mut best = f32::INFINITY;
    let mut found = None;
    for enemy in &state.enemies {
        if enemy.removed {
            continue;
        }
        let d = enemy.pos.distance_squared(pos);
        if d < best {
            best = d;
            found = Some(enemy.pos);
        }
    }
    if let Some(boss) = &state.boss {
        if !boss.removed && boss.pos.distance_squared(pos) < best {
            found = Some(boss.pos);
        }
    }
    found
}

/// Critical hits are rolled once here; the doubled damage rides the shot
/// for its whole lifetime.
fn roll_damage(state: &mut WorldState, base: f32, crit_chance: f32) -> (f32, bool) {
    use rand::Rng;
    let crit = crit_chance > 0.0 && state.rng.random_range(0.0..1.0) < crit_chance;
    (if crit { base * 2.0 } else { base }, crit)
}

fn fire_volley(state: &mut WorldState, player: &mut super::state::Player, target_pos: Vec2) {
    let to_target = target_pos - player.pos;
    let aim = to_target.y.atan2(to_target.x);

    // Straight shots fan out symmetrically around the aim line
    let n = player.multi_shot.max(1);
    let half = (n as f32 - 1.0) / 2.0;
    for i in 0..n {
        let angle = aim + (i as f32 - half) * VOLLEY_SPREAD;
        let (damage, crit) = roll_damage(state, player.damage, player.crit_chance);
        let id = state.next_entity_id();
        state
            .player_shots
            .push(Shot::normal(id, player.pos, angle, damage, crit));
    }

    let p = player.pierce_shots;
    let half = (p as f32 - 1.0) / 2.0;
    for i in 0..p {
        let angle = aim + (i as f32 - half) * VOLLEY_SPREAD;
        let (damage, crit) =
            roll_damage(state, player.damage * PIERCE_DAMAGE_MULT, player.crit_chance);
        let id = state.next_entity_id();
        state
            .player_shots
            .push(Shot::piercing(id, player.pos, angle, damage, crit));
    }

    state.push_event(GameEvent::ShotFired);
}

fn fire_missile(state: &mut WorldState, player: &mut super::state::Player) {
    use rand::Rng;
    // Launched upward-ish with scatter; homing takes over immediately
    let aim = -std::f32::consts::FRAC_PI_2 + state.rng.random_range(-0.8..0.8);
    let (damage, crit) =
        roll_damage(state, player.damage * MISSILE_DAMAGE_MULT, player.crit_chance);
    let target = super::projectile::nearest_enemy_id(state, player.pos);
    let id = state.next_entity_id();
    state
        .player_shots
        .push(Shot::missile(id, player.pos, aim, damage, crit, target));
}

/// Drones trail the player on a shared orbit, each firing a plain shot at
/// the nearest enemy in reach once a second
fn update_drones(state: &mut WorldState, dt: f32) {
    let Some(player_pos) = state.player.as_ref().map(|p| p.pos) else {
        return;
    };

    let mut drones = std::mem::take(&mut state.drones);
    for drone in drones.iter_mut() {
        drone.angle = normalize_angle(drone.angle + DRONE_ORBIT_RATE * dt);
        drone.pos = player_pos + angle_to_dir(drone.angle) * DRONE_ORBIT_DIST;

        drone.shoot_timer -= dt;
        if drone.shoot_timer <= 0.0 {
            drone.shoot_timer = DRONE_SHOOT_INTERVAL;
            if let Some(target_pos) = nearest_target(state, drone.pos) {
                if target_pos.distance(drone.pos) < DRONE_RANGE {
                    let to_target = target_pos - drone.pos;
                    let aim = to_target.y.atan2(to_target.x);
                    let id = state.next_entity_id();
                    state
                        .player_shots
                        .push(Shot::normal(id, drone.pos, aim, DRONE_DAMAGE, false));
                }
            }
        }
    }
    state.drones = drones;
}

/// Chest contact consumes the chest; the reward flow itself is the host's
fn check_chests(state: &mut WorldState) {
    let Some(player_pos) = state.player.as_ref().map(|p| p.pos) else {
        return;
    };
    let mut opened: Vec<u32> = Vec::new();
    for chest in state.chests.iter_mut() {
        if !chest.removed && player_pos.distance(chest.pos) < chest.radius + 10.0 {
            chest.removed = true;
            opened.push(chest.id);
        }
    }
    for id in opened {
        state.push_event(GameEvent::ChestOpened { id });
    }
}

/// Player contact with the altar summons the boss and consumes the altar
fn check_altar(state: &mut WorldState) {
    let Some(player) = state.player.as_ref() else {
        return;
    };
    let Some(altar) = state.altar.as_ref() else {
        return;
    };
    if player.pos.distance(altar.pos) < player.radius + altar.radius {
        let origin = altar.pos;
        state.altar = None;
        summon_boss(state, origin);
    }
}

fn check_run_end(state: &mut WorldState) {
    if state.player.as_ref().is_some_and(|p| p.hp <= 0.0) {
        state.push_event(GameEvent::PlayerDied);
        state.end_run(EndCause::PlayerDied);
        return;
    }
    // The stage is cleared the tick the boss falls
    if state.boss.as_ref().is_some_and(|b| b.removed) {
        state.end_run(EndCause::StageCleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::enemy::{Enemy, EnemyKind};
    use crate::sim::state::Loadout;

    fn run_ticks(state: &mut WorldState, input: &TickInput, n: usize) {
        for _ in 0..n {
            tick(state, input, SIM_DT);
        }
    }

    #[test]
    fn test_identical_seeds_replay_identically() {
        let loadout = Loadout {
            multi_shot: 2,
            pierce_shots: 1,
            missile_count: 1,
            crit_chance: 0.3,
            ..Loadout::default()
        };
        let mut a = WorldState::new(2024, 2, &loadout);
        let mut b = WorldState::new(2024, 2, &loadout);
        let input = TickInput {
            move_dir: Vec2::new(0.7, -0.2),
        };

        run_ticks(&mut a, &input, 600);
        run_ticks(&mut b, &input, 600);

        let sa = serde_json::to_string(&a).unwrap();
        let sb = serde_json::to_string(&b).unwrap();
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_diverging_seeds_diverge() {
        let mut a = WorldState::new(1, 1, &Loadout::default());
        let mut b = WorldState::new(2, 1, &Loadout::default());
        let input = TickInput::default();
        run_ticks(&mut a, &input, 300);
        run_ticks(&mut b, &input, 300);
        assert_ne!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_hp_never_exceeds_max() {
        let loadout = Loadout {
            hp_regen: 50.0,
            ..Loadout::default()
        };
        let mut state = WorldState::new(5, 1, &loadout);
        state.player.as_mut().unwrap().hp = 10.0;
        run_ticks(&mut state, &TickInput::default(), 1200);
        let player = state.player.as_ref().unwrap();
        assert!(player.hp <= player.max_hp + 1e-3);
    }

    #[test]
    fn test_movement_clamped_to_world() {
        let mut state = WorldState::new(9, 1, &Loadout::default());
        let input = TickInput {
            move_dir: Vec2::new(-1.0, 0.0),
        };
        run_ticks(&mut state, &input, 2000);
        let player = state.player.as_ref().unwrap();
        assert!(player.pos.x >= player.radius - 1e-3);
    }

    #[test]
    fn test_altar_contact_summons_boss_once() {
        let mut state = WorldState::new(42, 1, &Loadout::default());
        // Teleport the player onto the altar, with no obstacle interference
        state.obstacles.clear();
        let altar_pos = state.altar.as_ref().unwrap().pos;
        state.player.as_mut().unwrap().pos = altar_pos;

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.boss.is_some());
        assert!(state.altar.is_none());
        assert!(state.director.halted());
        assert_eq!(state.boss_origin, Some(altar_pos));
    }

    #[test]
    fn test_player_death_ends_run() {
        let mut state = WorldState::new(8, 1, &Loadout::default());
        state.player.as_mut().unwrap().hp = 0.5;
        // Surround with kamikazes so the next contact is lethal
        let player_pos = state.player.as_ref().unwrap().pos;
        let id = state.next_entity_id();
        state
            .enemies
            .push(Enemy::new(id, EnemyKind::Kamikaze, player_pos));

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, RunPhase::Ended(EndCause::PlayerDied));
        assert!(state.director.halted());

        // Further ticks are no-ops
        let snapshot = serde_json::to_string(&state).unwrap();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(snapshot, serde_json::to_string(&state).unwrap());
    }

    #[test]
    fn test_auto_fire_waits_for_targets() {
        let mut state = WorldState::new(13, 1, &Loadout::default());
        // A few intervals pass with an empty field
        run_ticks(&mut state, &TickInput::default(), 10);
        assert!(state.player_shots.is_empty());

        let player_pos = state.player.as_ref().unwrap().pos;
        let id = state.next_entity_id();
        state.enemies.push(Enemy::new(
            id,
            EnemyKind::Golem,
            player_pos + Vec2::new(200.0, 0.0),
        ));
        run_ticks(&mut state, &TickInput::default(), 40);
        let fired = state
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::ShotFired));
        assert!(fired);
    }

    #[test]
    fn test_drone_orbits_and_fires_in_range() {
        let loadout = Loadout {
            drone_count: 1,
            ..Loadout::default()
        };
        let mut state = WorldState::new(19, 1, &loadout);
        let player_pos = state.player.as_ref().unwrap().pos;
        let id = state.next_entity_id();
        state.enemies.push(Enemy::new(
            id,
            EnemyKind::Golem,
            player_pos + Vec2::new(150.0, 0.0),
        ));

        // Well inside one player shoot interval, so any shot is the drone's
        run_ticks(&mut state, &TickInput::default(), 10);
        let player_pos = state.player.as_ref().unwrap().pos;
        let drone = &state.drones[0];
        assert!((drone.pos.distance(player_pos) - DRONE_ORBIT_DIST).abs() < 1e-3);
        assert!(
            state
                .player_shots
                .iter()
                .any(|s| (s.damage - DRONE_DAMAGE).abs() < 1e-6),
            "drone never fired at an enemy in range"
        );
    }

    #[test]
    fn test_drone_holds_fire_out_of_range() {
        let loadout = Loadout {
            drone_count: 1,
            ..Loadout::default()
        };
        let mut state = WorldState::new(19, 1, &loadout);
        let player_pos = state.player.as_ref().unwrap().pos;
        let id = state.next_entity_id();
        state.enemies.push(Enemy::new(
            id,
            EnemyKind::Totem,
            player_pos + Vec2::new(900.0, 0.0),
        ));

        run_ticks(&mut state, &TickInput::default(), 10);
        assert!(
            !state
                .player_shots
                .iter()
                .any(|s| (s.damage - DRONE_DAMAGE).abs() < 1e-6),
            "drone fired at a target beyond its range"
        );
    }

    #[test]
    fn test_chest_contact_opens_once() {
        let mut state = WorldState::new(42, 1, &Loadout::default());
        state.obstacles.clear();
        let chest_pos = state.chests[0].pos;
        let chest_count = state.chests.len();
        state.player.as_mut().unwrap().pos = chest_pos;

        tick(&mut state, &TickInput::default(), SIM_DT);
        let opened = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::ChestOpened { .. }))
            .count();
        assert_eq!(opened, 1);
        assert_eq!(state.chests.len(), chest_count - 1);

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::ChestOpened { .. })),
            "consumed chest reopened"
        );
    }

    #[test]
    fn test_missile_burst_spreads_over_ticks() {
        let loadout = Loadout {
            missile_count: 3,
            ..Loadout::default()
        };
        let mut state = WorldState::new(31, 1, &loadout);
        let player_pos = state.player.as_ref().unwrap().pos;
        let id = state.next_entity_id();
        state.enemies.push(Enemy::new(
            id,
            EnemyKind::Golem,
            player_pos + Vec2::new(300.0, 0.0),
        ));

        // One volley interval plus the burst window
        run_ticks(&mut state, &TickInput::default(), 60);
        let missiles = state
            .player_shots
            .iter()
            .filter(|s| matches!(s.kind, crate::sim::projectile::ShotKind::Missile { .. }))
            .count();
        assert!(missiles >= 3, "expected a full burst, saw {missiles}");
    }
}
