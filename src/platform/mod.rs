//! Platform abstraction layer
//!
//! Handles host differences for:
//! - Logging backend (env_logger natively, browser console on wasm)
//! - Input events (keys and touch folded into one sampled `InputState`)
//! - Frame scheduling (`FrameLoop` drives tick → audio → persistence → draw)

use crate::audio::{AudioBackend, AudioManager};
use crate::highscores::BestScore;
use crate::persistence::Storage;
use crate::render::Renderer;
use crate::settings::Settings;
use crate::sim::{FrameClock, GameEvent, Session, TickInput, tick};

/// Install the logger for this target. Safe to call more than once.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

/// Sampled input, written by key/touch handlers and read once per frame.
///
/// `action`, `back`, and the menu shortcuts are one-shot: they latch on
/// press and are cleared after the frame that consumed them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub move_left: bool,
    pub move_right: bool,
    pub action: bool,
    pub duck: bool,
    pub back: bool,
    /// Open the how-to-play screen (menu only)
    pub instructions: bool,
    /// Open the level picker (menu only)
    pub level_select: bool,
    /// Autopilot toggle (persistent)
    pub idle_mode: bool,
}

impl InputState {
    /// Key pressed. `repeat` is the host's auto-repeat flag; repeats never
    /// re-trigger one-shots.
    pub fn key_down(&mut self, key: &str, repeat: bool) {
        match key {
            "ArrowLeft" | "a" | "A" => self.move_left = true,
            "ArrowRight" | "d" | "D" => self.move_right = true,
            "ArrowDown" | "s" | "S" => self.duck = true,
            " " | "ArrowUp" | "w" | "W" | "Enter" if !repeat => self.action = true,
            "Escape" if !repeat => self.back = true,
            "h" | "H" if !repeat => self.instructions = true,
            "l" | "L" if !repeat => self.level_select = true,
            "i" | "I" if !repeat => {
                self.idle_mode = !self.idle_mode;
                log::info!("Idle mode: {}", self.idle_mode);
            }
            _ => {}
        }
    }

    /// Key released; only held inputs care
    pub fn key_up(&mut self, key: &str) {
        match key {
            "ArrowLeft" | "a" | "A" => self.move_left = false,
            "ArrowRight" | "d" | "D" => self.move_right = false,
            "ArrowDown" | "s" | "S" => self.duck = false,
            _ => {}
        }
    }

    /// Touch began at `x_fraction` (0 = left edge, 1 = right edge).
    ///
    /// With `steer` the outer thirds move and the middle acts; without it
    /// any tap is an action.
    pub fn touch_start(&mut self, x_fraction: f32, steer: bool) {
        if !steer {
            self.action = true;
            return;
        }
        if x_fraction < 1.0 / 3.0 {
            self.move_left = true;
        } else if x_fraction > 2.0 / 3.0 {
            self.move_right = true;
        } else {
            self.action = true;
        }
    }

    /// All touches lifted
    pub fn touch_end(&mut self) {
        self.move_left = false;
        self.move_right = false;
    }

    /// Focus lost: drop held keys so nothing sticks
    pub fn release_all(&mut self) {
        let idle_mode = self.idle_mode;
        *self = Self {
            idle_mode,
            ..Self::default()
        };
    }

    pub fn to_tick_input(&self) -> TickInput {
        TickInput {
            move_left: self.move_left,
            move_right: self.move_right,
            action: self.action,
            duck: self.duck,
            back: self.back,
            idle_mode: self.idle_mode,
        }
    }

    /// Clear one-shot inputs after processing
    pub fn clear_one_shots(&mut self) {
        self.action = false;
        self.back = false;
        self.instructions = false;
        self.level_select = false;
    }
}

/// Host scheduler: one call per animation frame
pub struct FrameLoop<R: Renderer> {
    pub session: Session,
    pub input: InputState,
    pub audio: AudioManager,
    clock: FrameClock,
    best: BestScore,
    storage: Box<dyn Storage>,
    renderer: R,
}

impl<R: Renderer> FrameLoop<R> {
    /// Wire a session to its collaborators; the stored best seeds the
    /// session's ledger.
    pub fn new(
        mut session: Session,
        storage: Box<dyn Storage>,
        audio: AudioManager,
        renderer: R,
    ) -> Self {
        let best = BestScore::load(storage.as_ref(), &session.rules.best_key);
        session.ledger.record_best(best.value);
        Self {
            session,
            input: InputState::default(),
            audio,
            clock: FrameClock::new(),
            best,
            storage,
            renderer,
        }
    }

    /// Build everything a host needs from settings
    pub fn from_settings(
        settings: &Settings,
        storage: Box<dyn Storage>,
        backend: Option<Box<dyn AudioBackend>>,
        renderer: R,
    ) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        log::info!(
            "Starting {:?} with seed {} ({} quality)",
            settings.game,
            seed,
            settings.quality.as_str()
        );

        let mut session = Session::new(settings.ruleset(), seed);
        session.max_particles = settings.max_particles();

        let mut audio = backend.map_or_else(AudioManager::silent, AudioManager::new);
        settings.apply_audio(&mut audio);

        Self::new(session, storage, audio, renderer)
    }

    pub fn best(&self) -> u64 {
        self.best.value
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Host was hidden or suspended; the next frame counts as one step
    pub fn suspend(&mut self) {
        self.clock.reset();
        self.input.release_all();
    }

    /// Advance one frame at host time `now_ms` and draw it. Returns the
    /// events raised this frame.
    pub fn frame(&mut self, now_ms: f64) -> Vec<GameEvent> {
        let scale = self.clock.advance(now_ms);

        if self.input.instructions {
            self.session.open_instructions();
        }
        if self.input.level_select {
            self.session.open_level_select();
        }
        let input = self.input.to_tick_input();
        tick(&mut self.session, &input, scale);
        self.input.clear_one_shots();

        let events = self.session.drain_events();
        self.audio.play_events(&events);
        for event in &events {
            if let GameEvent::NewBest(value) = event {
                self.persist_best(*value);
            }
        }

        self.renderer.draw(&self.session.snapshot());
        events
    }

    fn persist_best(&mut self, value: u64) {
        if !self.best.submit(value) {
            return;
        }
        match self.best.save(self.storage.as_mut()) {
            Ok(()) => log::info!("Best value saved: {}", value),
            Err(e) => log::warn!("Could not save best value: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::NOMINAL_FRAME_MS;
    use crate::persistence::{MemoryStorage, UnavailableStorage};
    use crate::render::NullRenderer;
    use crate::sim::{GameKind, Ruleset, SessionPhase};

    fn runner_loop(storage: Box<dyn Storage>) -> FrameLoop<NullRenderer> {
        FrameLoop::new(
            Session::new(Ruleset::runner(), 7),
            storage,
            AudioManager::silent(),
            NullRenderer::default(),
        )
    }

    #[test]
    fn test_key_mapping_and_one_shots() {
        let mut input = InputState::default();
        input.key_down("ArrowLeft", false);
        input.key_down("ArrowRight", false);
        input.key_down(" ", false);
        let tick_input = input.to_tick_input();
        assert!(tick_input.move_left && tick_input.move_right && tick_input.action);

        input.clear_one_shots();
        assert!(!input.action);
        // Held keys survive the frame
        assert!(input.move_left);

        input.key_up("ArrowLeft");
        assert!(!input.move_left);

        // Auto-repeat never re-latches the action
        input.key_down(" ", true);
        assert!(!input.action);
    }

    #[test]
    fn test_touch_zones() {
        let mut input = InputState::default();
        input.touch_start(0.1, true);
        assert!(input.move_left);
        input.touch_start(0.5, true);
        assert!(input.action);
        input.touch_end();
        assert!(!input.move_left);

        let mut input = InputState::default();
        input.touch_start(0.1, false);
        assert!(input.action && !input.move_left);
    }

    #[test]
    fn test_release_all_keeps_idle_mode() {
        let mut input = InputState::default();
        input.key_down("i", false);
        input.key_down("s", false);
        input.release_all();
        assert!(input.idle_mode);
        assert!(!input.duck);
    }

    #[test]
    fn test_frame_starts_run_and_draws() {
        let mut fl = runner_loop(Box::new(MemoryStorage::new()));
        fl.input.key_down(" ", false);
        let events = fl.frame(0.0);
        assert_eq!(fl.session.phase, SessionPhase::Active);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PhaseChanged {
                to: SessionPhase::Active,
                ..
            }
        )));
        assert!(!fl.input.action);
        assert_eq!(fl.renderer().frames, 1);
    }

    #[test]
    fn test_new_best_is_persisted() {
        let mut fl = runner_loop(Box::new(MemoryStorage::new()));
        fl.input.action = true;
        fl.frame(0.0);

        fl.session.ledger.score = 500.0;
        fl.input.back = true;
        let events = fl.frame(NOMINAL_FRAME_MS);
        assert!(events.contains(&GameEvent::NewBest(500)));
        assert_eq!(fl.session.phase, SessionPhase::Menu);
        assert_eq!(fl.best(), 500);
        assert_eq!(
            fl.storage().get("dino_high_score").unwrap().as_deref(),
            Some("500")
        );
    }

    #[test]
    fn test_stored_best_seeds_session() {
        let mut storage = MemoryStorage::new();
        storage.set("dino_high_score", "900").unwrap();
        let fl = runner_loop(Box::new(storage));
        assert_eq!(fl.best(), 900);
        assert_eq!(fl.session.ledger.best(), 900);
    }

    #[test]
    fn test_best_uses_ruleset_key() {
        let mut storage = MemoryStorage::new();
        storage.set("custom_best", "777").unwrap();
        let mut rules = Ruleset::runner();
        rules.best_key = "custom_best".to_string();
        let mut fl = FrameLoop::new(
            Session::new(rules, 7),
            Box::new(storage),
            AudioManager::silent(),
            NullRenderer::default(),
        );
        assert_eq!(fl.best(), 777);
        assert_eq!(fl.session.ledger.best(), 777);

        fl.input.action = true;
        fl.frame(0.0);
        fl.session.ledger.score = 800.0;
        fl.input.back = true;
        fl.frame(NOMINAL_FRAME_MS);
        assert_eq!(fl.storage().get("custom_best").unwrap().as_deref(), Some("800"));
        assert_eq!(fl.storage().get("dino_high_score").unwrap(), None);
    }

    #[test]
    fn test_unavailable_storage_degrades() {
        let mut fl = runner_loop(Box::new(UnavailableStorage));
        assert_eq!(fl.best(), 0);
        fl.input.action = true;
        fl.frame(0.0);
        fl.session.ledger.score = 50.0;
        fl.input.back = true;
        fl.frame(NOMINAL_FRAME_MS);
        // Kept in memory even though the write failed
        assert_eq!(fl.best(), 50);
    }

    #[test]
    fn test_menu_shortcuts() {
        let mut fl = FrameLoop::new(
            Session::new(Ruleset::quest(), 3),
            Box::new(MemoryStorage::new()),
            AudioManager::silent(),
            NullRenderer::default(),
        );
        fl.input.key_down("l", false);
        fl.frame(0.0);
        assert_eq!(fl.session.phase, SessionPhase::LevelSelect);
        fl.input.key_down("Escape", false);
        fl.frame(NOMINAL_FRAME_MS);
        assert_eq!(fl.session.phase, SessionPhase::Menu);
        fl.input.key_down("h", false);
        fl.frame(NOMINAL_FRAME_MS * 2.0);
        assert_eq!(fl.session.phase, SessionPhase::Instructions);
    }

    #[test]
    fn test_from_settings_applies_preferences() {
        let settings = Settings {
            game: GameKind::Quest,
            seed: Some(11),
            particles: false,
            ..Settings::default()
        };
        let fl = FrameLoop::from_settings(
            &settings,
            Box::new(MemoryStorage::new()),
            None,
            NullRenderer::default(),
        );
        assert_eq!(fl.session.kind(), GameKind::Quest);
        assert_eq!(fl.session.seed, 11);
        assert_eq!(fl.session.max_particles, 0);
        assert!(!fl.audio.is_available());
    }
}
