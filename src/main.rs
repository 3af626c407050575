//! Headless demo runner
//!
//! Drives the simulation for a fixed span with a canned input pattern and
//! prints the final run stats. Useful for smoke-testing balance changes
//! and eyeballing determinism from the command line.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use neon_arena::consts::SIM_DT;
    use neon_arena::sim::{TickInput, WorldState, tick};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xA11CE);
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0);

    let loadout = neon_arena::sim::Loadout {
        multi_shot: 2,
        pierce_shots: 1,
        missile_count: 2,
        drone_count: 1,
        crit_chance: 0.15,
        max_shield: 30.0,
        ..Default::default()
    };
    let mut state = WorldState::new(seed, 1, &loadout);

    let ticks = (seconds / SIM_DT) as u32;
    for i in 0..ticks {
        // Wide circle around the arena center keeps the run interesting
        let t = i as f32 * SIM_DT * 0.4;
        let input = TickInput {
            move_dir: Vec2::new(t.cos(), t.sin()),
        };
        tick(&mut state, &input, SIM_DT);
        for event in state.drain_events() {
            log::debug!("{event:?}");
        }
        if state.phase != neon_arena::sim::RunPhase::Running {
            break;
        }
    }

    println!(
        "seed={seed} phase={:?} elapsed={:.1}s difficulty={:.2}",
        state.phase,
        state.director.elapsed,
        state.director.difficulty()
    );
    println!(
        "enemies alive={} energy={} kills={:?}",
        state.enemies.len(),
        state.stats.energy_collected,
        state.stats.kills
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {}
