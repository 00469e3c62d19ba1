//! Arcade Sim entry point
//!
//! Runs a headless demo: the autopilot plays a session at the
//! nominal frame rate and the result is printed. Browser hosts link the
//! library directly.

use std::path::Path;

use arcade_sim::audio::ToneLog;
use arcade_sim::consts::NOMINAL_FRAME_MS;
use arcade_sim::persistence::FileStorage;
use arcade_sim::platform::{FrameLoop, init_logging};
use arcade_sim::render::TextRenderer;
use arcade_sim::sim::GameEvent;
use arcade_sim::{GameChoice, Settings};

fn main() {
    init_logging();
    log::info!("Arcade Sim (native) starting...");

    let mut settings = Settings::load_or_default(Path::new(Settings::FILE_NAME));
    let mut frames: u32 = 60 * 60;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "runner" | "dino" => settings.game = GameChoice::Runner,
            "quest" | "drunkard" => settings.game = GameChoice::Quest,
            other => match other.parse() {
                Ok(n) => frames = n,
                Err(_) => log::warn!("Ignoring argument `{other}`"),
            },
        }
    }

    let renderer = TextRenderer::new(
        settings.game,
        settings.effective_score_flash(),
        settings.show_hitboxes,
    );
    let mut game = FrameLoop::from_settings(
        &settings,
        Box::new(FileStorage::new("arcade_scores.json")),
        Some(Box::new(ToneLog::default())),
        renderer,
    );
    game.input.idle_mode = true;

    let mut finished = false;
    for frame in 0..frames {
        let events = game.frame(frame as f64 * NOMINAL_FRAME_MS);
        for event in &events {
            match event {
                GameEvent::GameOver { final_value } | GameEvent::Victory { final_value } => {
                    finished = true;
                    println!("Run ended at frame {frame}: {final_value}");
                }
                GameEvent::LevelCleared { level } => println!("Level {level} cleared"),
                _ => {}
            }
        }
        if finished {
            break;
        }
    }

    if let Some(hud) = &game.renderer().hud {
        println!("{}", hud.line());
    }
    println!(
        "Phase {:?}, best {} after {} frames",
        game.session.phase,
        game.best(),
        game.renderer().frames
    );
}
