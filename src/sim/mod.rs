//! Deterministic simulation core
//!
//! State lives in [`state::WorldState`]; [`tick`] advances it. Hosts
//! construct a world from a seed, tier, and loadout, call `tick` with the
//! frame input and delta time, then drain the event outbox for feedback.

pub mod boss;
pub mod combat;
pub mod director;
pub mod enemy;
pub mod projectile;
pub mod state;
pub mod tick;

pub use state::{EndCause, GameEvent, Loadout, Player, RunPhase, RunStats, WorldState};
pub use tick::{TickInput, tick};
