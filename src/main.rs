//! Bounce Survivor headless runner
//!
//! Drives the simulation with a scripted player and prints every emitted
//! event as a JSON line.
//!
//! Usage: `bounce-survivor [config.json] [ticks] [seed]`

use std::io::{self, BufWriter, Write};
use std::sync::Arc;

use glam::Vec2;

use bounce_survivor::GameConfig;
use bounce_survivor::consts::SIM_DT;
use bounce_survivor::sim::{EulerIntegrator, GameEvent, GamePhase, ShootRequest, TickInput, World, tick};

const DEFAULT_CONFIG: &str = "assets/config.json";
const DEFAULT_TICKS: u64 = 60 * 120;
const DEFAULT_SEED: u64 = 0x5EED;

/// Circle the map centre and shoot at the nearest visible enemy
fn scripted_input(world: &World) -> TickInput {
    let tuning = &world.config.tuning;
    let center = Vec2::new(tuning.map_width, tuning.map_height) / 2.0;
    let t = (world.now / 1000.0) as f32;
    let waypoint = center + Vec2::new(t.cos(), t.sin()) * 150.0;

    let player = world.player.pos;
    let target = world
        .enemies
        .iter()
        .filter(|e| e.is_active())
        .min_by(|a, b| a.pos.distance_squared(player).total_cmp(&b.pos.distance_squared(player)));
    let shoot = target.map(|e| {
        let aim = e.pos - player;
        ShootRequest {
            origin: player,
            aim_angle: aim.y.atan2(aim.x),
            time: world.now,
        }
    });

    TickInput {
        move_dir: waypoint - player,
        shoot,
        upgrade_selected: (world.phase == GamePhase::ChoicePending).then_some(0),
    }
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let ticks = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_TICKS);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SEED);

    let config = Arc::new(GameConfig::load_or_default(&config_path));
    let mut world = World::new(config, seed);
    let mut physics = EulerIntegrator;
    log::info!("Bounce Survivor starting: {ticks} ticks, seed {seed}");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut kills = 0u32;

    for _ in 0..ticks {
        let input = scripted_input(&world);
        tick(&mut world, &input, SIM_DT, &mut physics);

        for event in world.drain_events() {
            if matches!(event, GameEvent::EnemyKilled { .. }) {
                kills += 1;
            }
            serde_json::to_writer(&mut out, &event).map_err(io::Error::other)?;
            writeln!(out)?;
        }
        if world.phase == GamePhase::GameOver {
            break;
        }
    }
    out.flush()?;

    log::info!(
        "Finished at {:.1}s: level {}, {} kills, {} items, hp {:.0}/{:.0}, phase {:?}",
        world.now / 1000.0,
        world.leveling.level,
        kills,
        world.items.len(),
        world.player.hp,
        world.player.max_hp,
        world.phase
    );
    Ok(())
}
