//! Neon Arena - simulation core for an arena survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (director, combat, boss state machines)
//!
//! Everything outside `sim` (rendering, audio, input capture, persistence)
//! is a host concern. The host feeds a movement vector and a delta time into
//! [`sim::tick`] each frame and drains the event outbox afterwards.

pub mod sim;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference fixed timestep (60 Hz); hosts may supply a variable dt
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// World dimensions (square arena)
    pub const WORLD_WIDTH: f32 = 2000.0;
    pub const WORLD_HEIGHT: f32 = 2000.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 20.0;
    pub const PLAYER_SPEED: f32 = 200.0;
    pub const PLAYER_MAX_HP: f32 = 100.0;
    pub const PLAYER_DAMAGE: f32 = 10.0;
    pub const PLAYER_SHOOT_INTERVAL: f32 = 0.5;

    /// Shield regenerates at this rate after 5 seconds without a hit
    pub const SHIELD_REGEN_DELAY: f32 = 5.0;
    pub const SHIELD_REGEN_RATE: f32 = 10.0;

    /// Enemy spawn band: outside the viewport, around the player
    pub const SPAWN_DIST_MIN: f32 = 500.0;
    pub const SPAWN_DIST_BAND: f32 = 200.0;

    /// Spawn cadence bounds
    pub const SPAWN_INTERVAL_BASE: f32 = 1.5;
    pub const SPAWN_INTERVAL_MIN: f32 = 0.2;
    pub const SPAWN_BATCH_MAX: u32 = 5;

    /// Boss altar placement distance from the player at run start
    pub const ALTAR_DIST: f32 = 800.0;
    pub const ALTAR_RADIUS: f32 = 40.0;

    /// Drop behaviour
    pub const DROP_RADIUS: f32 = 6.0;
    pub const DROP_MAGNET_RADIUS: f32 = 100.0;
    pub const DROP_HOMING_SPEED: f32 = 400.0;

    /// Reward chests scattered at run start
    pub const CHEST_COUNT: u32 = 10;
    pub const CHEST_RADIUS: f32 = 20.0;
}

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector for an angle
#[inline]
pub fn angle_to_dir(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Rotate `current` toward `target` by at most `max_delta` radians,
/// snapping to the exact target angle when within that tolerance.
#[inline]
pub fn turn_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = normalize_angle(target - current);
    if diff.abs() <= max_delta {
        target
    } else {
        normalize_angle(current + max_delta.copysign(diff))
    }
}

/// Clamp a position into the world rectangle, keeping `margin` from the edges
#[inline]
pub fn clamp_to_world(pos: Vec2, margin: f32) -> Vec2 {
    Vec2::new(
        pos.x.clamp(margin, consts::WORLD_WIDTH - margin),
        pos.y.clamp(margin, consts::WORLD_HEIGHT - margin),
    )
}

/// True once a point has left the world rectangle entirely
#[inline]
pub fn out_of_world(pos: Vec2) -> bool {
    pos.x < 0.0 || pos.x > consts::WORLD_WIDTH || pos.y < 0.0 || pos.y > consts::WORLD_HEIGHT
}
