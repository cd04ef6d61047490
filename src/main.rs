/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::LevelEvent;
use sim::level::{self, Layout};
use sim::step;
use sim::world::LevelState;
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_CONFIRM, KEYS_QUIT, KEYS_RESTART};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Totals across every attempt of the session.
#[derive(Default)]
struct Session {
    attempts: u32,
    wins: u32,
    best_coins: u32,
}

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for warning in &config.warnings {
        log::warn!("config: {warning}");
    }

    let layout = match level::resolve_layout(config.level_dir.as_deref()) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Could not load level: {e}");
            std::process::exit(1);
        }
    };
    let mut level = match LevelState::from_layout(&layout, &config.sim) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Invalid level '{}': {e}", layout.name);
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    let enhanced_keys = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let mut session = Session { attempts: 1, ..Session::default() };
    let result = game_loop(&mut level, &layout, &mut renderer, enhanced_keys, &config, &mut session);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
    }

    session.best_coins = session.best_coins.max(level.coins_collected);
    println!();
    println!("Thanks for playing Dungeon Scroller!");
    println!(
        "Attempts: {}   Escapes: {}   Most coins in one run: {}",
        session.attempts, session.wins, session.best_coins,
    );
}

/// Log to the configured file. Without one, stderr is used but stays
/// silent unless RUST_LOG asks for output (the renderer owns the screen).
fn init_logging(config: &GameConfig) {
    let default_filter = if config.log_file.is_some() { "info" } else { "off" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    );
    if let Some(path) = &config.log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("Could not open log file {}: {e}", path.display());
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }
    // A second init (tests, embedding) is harmless.
    let _ = builder.try_init();
}

fn game_loop(
    level: &mut LevelState,
    layout: &Layout,
    renderer: &mut Renderer,
    enhanced_keys: bool,
    config: &GameConfig,
    session: &mut Session,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced_keys;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        log::info!("gamepad detected");
    }
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.frame_ms);

    // Jump presses seen between ticks are held until the next step.
    let mut pending_jump = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
            break;
        }

        if wants_restart(level, &kb, &gp) {
            session.best_coins = session.best_coins.max(level.coins_collected);
            *level = LevelState::from_layout(layout, &config.sim)?;
            session.attempts += 1;
            pending_jump = false;
            log::info!("attempt {} started", session.attempts);
            renderer.invalidate()?;
        }

        let input = merge_input(&kb, &gp);
        pending_jump |= input.jump;

        if last_tick.elapsed() >= tick_rate {
            let frame_input = FrameInput { movement: input.movement, jump: pending_jump };
            pending_jump = false;
            let events = step::step(level, frame_input);
            record_events(session, &events);
            last_tick = Instant::now();
        }

        renderer.render(level)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// R restarts at any time; Enter/Start also restarts once the level is over.
fn wants_restart(level: &LevelState, kb: &InputState, gp: &GamepadState) -> bool {
    if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
        return true;
    }
    level.is_finished() && (kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed())
}

/// Keyboard first; the gamepad fills in whatever the keyboard left idle.
fn merge_input(kb: &InputState, gp: &GamepadState) -> FrameInput {
    let k = kb.frame_input();
    let g = gp.frame_input();
    FrameInput {
        movement: k.movement.or(g.movement),
        jump: k.jump || g.jump,
    }
}

fn record_events(session: &mut Session, events: &[LevelEvent]) {
    for event in events {
        match event {
            LevelEvent::LevelWon => session.wins += 1,
            LevelEvent::CoinCollected { total } => {
                session.best_coins = session.best_coins.max(*total);
            }
            LevelEvent::Jumped | LevelEvent::Landed => log::trace!("{event:?}"),
            LevelEvent::LevelLost => {}
        }
    }
}
