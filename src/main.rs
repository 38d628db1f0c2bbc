/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use config::GameConfig;
use domain::entity::{Action, FrameInput};
use sim::session::{GameSession, GameStatus, Phase};
use ui::gamepad::GamepadState;
use ui::input::{InputState, Meta};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let (config, warning) = GameConfig::load();
    logging::init(config.verbose);
    if let Some(w) = warning {
        log::warn!("{w}");
    }

    let mut session = GameSession::new(&config);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Crystal Run!");
    println!("Final Score: {}", session.scoreboard.score);
    println!("Seed: {}  (set [general] seed to replay)", session.seed);
}

fn game_loop(
    session: &mut GameSession,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> std::io::Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        log::info!("gamepad detected");
    }
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    // Pad presses are frame-local; a fire press is held here until the next tick.
    let mut pad_pending: Option<Action> = None;

    loop {
        kb.drain_events();
        gp.update();

        if handle_meta(session, &kb, &gp) {
            break;
        }

        if let Some(a) = gp.action() {
            if pad_pending != Some(Action::Fire) {
                pad_pending = Some(a);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            // Keyboard first, then the pad.
            let action = kb.take_action().or(pad_pending.take());
            let tick = session.advance(FrameInput { action });
            if let Some(sfx) = sound {
                sfx.play_events(&tick.events);
            }
            let status_change = report_status(tick.status, session);
            if status_change || session.phase != Phase::Playing {
                kb.clear();
                pad_pending = None;
            }
            last_tick = Instant::now();
        }

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Log a session status change. Returns true for anything but `Continue`,
/// where input buffered for the old level must be dropped.
fn report_status(status: GameStatus, session: &GameSession) -> bool {
    let sb = &session.scoreboard;
    match status {
        GameStatus::Continue => return false,
        GameStatus::PlayerDied if session.is_over() => {
            log::info!("game over on level {} with score {}", session.level, sb.score)
        }
        GameStatus::PlayerDied => log::info!("avatar died, {} lives left", sb.lives),
        GameStatus::LevelFinished => log::info!("level {} cleared, score {}", session.level, sb.score),
        GameStatus::LevelLoadError => log::error!("level {} could not be loaded", session.level),
        GameStatus::AllLevelsWon => log::info!("all levels cleared, final score {}", sb.score),
    }
    true
}

/// Session-level keys. Returns true when the game should exit.
fn handle_meta(session: &mut GameSession, kb: &InputState, gp: &GamepadState) -> bool {
    if kb.meta_pressed(Meta::Quit) || gp.cancel_pressed() {
        return true;
    }
    if session.is_over() {
        return kb.meta_pressed(Meta::Confirm) || gp.confirm_pressed();
    }
    if kb.meta_pressed(Meta::Restart) || gp.restart_pressed() {
        session.restart_level();
    }
    false
}
