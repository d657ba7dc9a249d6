use app::app_loop::{AppState, FrameOutcome};
use app::frame_input::capture_frame_input;
use app::save_paths::{default_save_path, save_or_clear};
use app::ui_render::{GlyphSurface, draw_overlays};
use app::window_config::WindowConfig;
use game_core::engine::Engine;
use game_core::persist::{SaveError, load_from_path};
use macroquad::prelude::{Conf, next_frame, screen_height, screen_width};

fn window_conf() -> Conf {
    let config = WindowConfig::load_or_default(WindowConfig::get_default_path().as_deref());
    Conf {
        window_title: "Gloomcrawl".to_string(),
        window_width: config.width,
        window_height: config.height,
        fullscreen: config.fullscreen,
        ..Default::default()
    }
}

/// Remembers the window's final size for the next launch. Best effort; a
/// failed write only costs the remembered size.
fn persist_window_config() {
    let Some(path) = WindowConfig::get_default_path() else {
        return;
    };
    let config = WindowConfig::load_or_default(Some(&path))
        .resized(screen_width() as i32, screen_height() as i32);
    if let Err(e) = config.write_atomic(&path) {
        eprintln!("could not save window settings: {e}");
    }
}

/// Resume the saved run when one exists; anything else starts fresh. A
/// corrupt save is reported and abandoned rather than crashing the game.
fn load_or_new_game() -> Engine {
    let Some(path) = default_save_path() else {
        return Engine::new_game(app::fresh_run_seed(macroquad::miniquad::date::now()));
    };
    match load_from_path(&path) {
        Ok(engine) => engine,
        Err(SaveError::Missing) => {
            Engine::new_game(app::fresh_run_seed(macroquad::miniquad::date::now()))
        }
        Err(e) => {
            eprintln!("ignoring unreadable save: {e}");
            Engine::new_game(app::fresh_run_seed(macroquad::miniquad::date::now()))
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let mut engine = load_or_new_game();
    let mut state = AppState::new();
    let mut surface = GlyphSurface::new();

    loop {
        let input = capture_frame_input(&surface);
        if state.tick(&mut engine, &input) == FrameOutcome::SaveAndExit {
            if let Some(path) = default_save_path() {
                if let Err(e) = save_or_clear(&engine, &path) {
                    eprintln!("could not save the run: {e}");
                }
            }
            persist_window_config();
            break;
        }

        engine.render(&mut surface);
        draw_overlays(&engine, &state.mode, &mut surface);
        next_frame().await;
    }
}
