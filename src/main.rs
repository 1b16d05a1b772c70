//! Snack Attack headless runner
//!
//! Plays either game on autopilot for a fixed number of frames, logging
//! game events as they happen and printing the final render feed as JSON.
//!
//! Usage: `snack-attack [platformer|arena] [seed] [frames] [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
use snack_attack::{
    ArenaTuning, PlatformerTuning, Settings,
    arena::ArenaState,
    platformer::PlatformerState,
    sim::{GameEvent, Simulation, TickInput},
};

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_FRAMES: u64 = 3600;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let game = args.first().map(String::as_str).unwrap_or("arena");
    let settings = match args.get(3) {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => Settings::from_json(&json),
            Err(e) => {
                log::warn!("Can't read settings {path}: {e}");
                Settings::default()
            }
        },
        None => Settings::default(),
    };
    let seed = args
        .get(1)
        .and_then(|s| s.parse().ok())
        .or(settings.seed)
        .unwrap_or(42);
    let frames = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    log::info!(
        "Snack Attack: {game}, seed {seed}, {frames} frames, {} blasts",
        settings.explosion_policy.as_str()
    );

    let dt = settings.frame_dt(None);
    let json = match game {
        "platformer" => {
            let mut state = PlatformerState::new(PlatformerTuning::default(), settings, seed);
            run(&mut state, frames, dt);
            serde_json::to_string_pretty(&state.render_feed())
        }
        "arena" => {
            let mut state = ArenaState::new(ArenaTuning::default(), settings, seed);
            run(&mut state, frames, dt);
            serde_json::to_string_pretty(&state.render_feed())
        }
        other => {
            eprintln!("Unknown game '{other}' (expected platformer or arena)");
            std::process::exit(2);
        }
    };

    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("Render feed serialization failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Step `sim` on autopilot, logging events as they come out
#[cfg(not(target_arch = "wasm32"))]
fn run<S: Simulation>(sim: &mut S, frames: u64, dt: f32) {
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    for frame in 0..frames {
        sim.step(&input, dt);
        for event in sim.drain_events() {
            match event {
                GameEvent::ActorSpawned { .. } | GameEvent::ActorRemoved { .. } => {
                    log::trace!("[{frame}] {event:?}")
                }
                GameEvent::ChargeChanged { .. } | GameEvent::Blast { .. } => {
                    log::debug!("[{frame}] {event:?}")
                }
                _ => log::info!("[{frame}] {event:?}"),
            }
        }
        if !sim.phase().is_running() && frame > 0 {
            log::info!("Stopped at frame {frame} in {:?}", sim.phase());
            break;
        }
    }
    log::info!("Final score {}", sim.score());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts drive the library directly on the web
}
