//! Session state and lifecycle
//!
//! All state that must be persisted for Continue/determinism lives here.
//! A [`Session`] owns every mutable piece of one game: player, entity lists,
//! spawners, ledger, difficulty and the seeded RNG. Phase changes happen only
//! through the methods below, which reset the per-run state to its canonical
//! initial values.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::{ContinuousDifficulty, Difficulty, LevelDef, StagedDifficulty};
use super::entity::{
    Currency, Decoration, DecorationKind, Entity, EntityKind, Motion, Particle, PowerUpKind,
};
use super::ledger::Ledger;
use super::player::Player;
use super::rules::{GameKind, ModeRules, Ruleset};
use super::spawner::{GapDraw, GapRange, Spawner};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Title screen; waiting for start input
    #[default]
    Menu,
    /// How-to-play screen (pure UI)
    Instructions,
    /// Level picker (pure UI)
    LevelSelect,
    /// Simulating
    Active,
    /// Level cleared
    Won,
    /// Run over
    Lost,
    /// Final level cleared
    Ending,
}

impl SessionPhase {
    /// Outcome screens gated by the display delay
    pub fn is_outcome(self) -> bool {
        matches!(self, SessionPhase::Won | SessionPhase::Lost | SessionPhase::Ending)
    }
}

/// Fire-and-forget notifications for audio, haptics and telemetry
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: SessionPhase, to: SessionPhase },
    Jumped,
    Collected { currency: Currency, earned: u64 },
    /// Streak crossed into a higher multiplier
    ComboUp { multiplier: f32 },
    Healed,
    Hurt { lives_left: u8 },
    /// Harm converted to currency while protected
    Shielded { earned: u64 },
    PowerUp(PowerUpKind),
    Cleared { count: u32, earned: u64 },
    ExtraLife,
    Milestone(u64),
    NightToggled { night: bool },
    LevelStarted { level: u32 },
    LevelCleared { level: u32 },
    GameOver { final_value: u64 },
    Victory { final_value: u64 },
    NewBest(u64),
}

/// Spawners owned by the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawners {
    /// Obstacles (runner) or falling items (quest)
    pub primary: Spawner,
    /// Runner coins
    pub coins: Option<Spawner>,
    /// Runner clouds
    pub clouds: Option<Spawner>,
}

impl Spawners {
    fn for_rules(rules: &Ruleset) -> Self {
        match &rules.mode {
            ModeRules::Runner(runner) => Self {
                primary: Spawner::new(runner.obstacle_gap, GapDraw::Uniform)
                    .with_floor(runner.obstacle_gap.min * runner.speed.gap_floor),
                coins: Some(Spawner::new(runner.coin_gap, GapDraw::Uniform)),
                clouds: Some(Spawner::new(runner.cloud_gap, GapDraw::Uniform)),
            },
            ModeRules::Quest(quest) => {
                let interval = quest.levels.first().map_or(60.0, |l| l.spawn_interval);
                Self {
                    primary: Spawner::new(GapRange::fixed(interval), GapDraw::Midpoint),
                    coins: None,
                    clouds: None,
                }
            }
        }
    }

    fn reset(&mut self, factor: f32, rng: &mut Pcg32) {
        self.primary.reset(factor, rng);
        for spawner in [&mut self.coins, &mut self.clouds].into_iter().flatten() {
            spawner.reset(1.0, rng);
        }
    }
}

/// Default particle cap (overridden by the quality preset)
pub const MAX_PARTICLES: usize = 256;
/// Stars drawn in the runner's night sky
const STAR_COUNT: usize = 14;

fn default_max_particles() -> usize {
    MAX_PARTICLES
}

/// One game session (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Balance tables for this game
    pub rules: Ruleset,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: SessionPhase,
    /// Ticks spent in the current phase
    pub phase_ticks: f32,
    /// Frames simulated since creation
    pub time_ticks: u64,
    pub player: Player,
    /// Active entities in spawn (id) order
    pub entities: Vec<Entity>,
    pub decorations: Vec<Decoration>,
    pub ledger: Ledger,
    pub difficulty: Difficulty,
    pub spawners: Spawners,
    pub night: bool,
    /// Highest 0-based level the player may pick in level select
    pub highest_unlocked: usize,
    /// Level highlighted in level select
    pub selected_level: usize,
    /// Horizontal input last tick, for edge-triggered menu navigation
    pub(crate) prev_horizontal: i8,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    #[serde(skip, default = "default_max_particles")]
    pub max_particles: usize,
    /// Events raised since the last drain
    #[serde(skip)]
    events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl Session {
    /// Create a session in the menu phase
    pub fn new(rules: Ruleset, seed: u64) -> Self {
        let difficulty = match &rules.mode {
            ModeRules::Runner(runner) => {
                Difficulty::Continuous(ContinuousDifficulty::new(runner.speed))
            }
            ModeRules::Quest(quest) => Difficulty::Staged(
                StagedDifficulty::new(quest.levels.clone()).unwrap_or_else(|e| {
                    log::warn!("{e}; using the built-in level table");
                    StagedDifficulty::canonical()
                }),
            ),
        };
        let player = Player::new(rules.player.clone(), rules.ground_y, rules.width);
        let ledger = Ledger::new(rules.combo.clone(), rules.start_lives, rules.max_lives);
        let spawners = Spawners::for_rules(&rules);
        let mut rng = Pcg32::seed_from_u64(seed);

        let mut decorations = Vec::new();
        if rules.kind() == GameKind::Runner {
            // Star band needs a non-empty range even on a very short arena
            let sky = (rules.ground_y * 0.6).max(6.0);
            for _ in 0..STAR_COUNT {
                decorations.push(Decoration {
                    kind: DecorationKind::Star,
                    pos: Vec2::new(rng.random_range(0.0..rules.width), rng.random_range(5.0..sky)),
                    size: rng.random_range(1.0..2.5),
                    twinkle: rng.random_range(0.0..std::f32::consts::TAU),
                });
            }
            decorations.push(Decoration {
                kind: DecorationKind::Moon,
                pos: Vec2::new(rules.width * 0.8, 30.0),
                size: 20.0,
                twinkle: 0.0,
            });
        }

        let mut session = Self {
            rules,
            seed,
            rng,
            phase: SessionPhase::Menu,
            phase_ticks: 0.0,
            time_ticks: 0,
            player,
            entities: Vec::new(),
            decorations,
            ledger,
            difficulty,
            spawners,
            night: false,
            highest_unlocked: 0,
            selected_level: 0,
            prev_horizontal: 0,
            particles: Vec::new(),
            max_particles: MAX_PARTICLES,
            events: Vec::new(),
            next_id: 1,
        };
        let factor = session.difficulty.gap_factor();
        session.spawners.reset(factor, &mut session.rng);
        session
    }

    /// Seed the persisted best value read at startup
    pub fn with_best(mut self, best: u64) -> Self {
        self.ledger.record_best(best);
        self
    }

    pub fn kind(&self) -> GameKind {
        self.rules.kind()
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an entity at the end of the active list
    pub fn spawn_entity(&mut self, kind: EntityKind, pos: Vec2, motion: Motion, spin: f32) -> u32 {
        let id = self.next_entity_id();
        let mut entity = Entity::new(id, kind, pos, motion);
        entity.spin = spin;
        self.entities.push(entity);
        id
    }

    /// Add a particle, dropping the oldest past the cap
    pub fn push_particle(&mut self, particle: Particle) {
        if self.max_particles == 0 {
            return;
        }
        if self.particles.len() >= self.max_particles {
            self.particles.remove(0);
        }
        self.particles.push(particle);
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current level (staged difficulty only)
    pub fn level(&self) -> Option<&LevelDef> {
        self.difficulty.level()
    }

    /// Current level's wealth threshold
    pub fn target(&self) -> Option<u64> {
        self.level().map(|l| l.target)
    }

    fn level_index(&self) -> usize {
        match &self.difficulty {
            Difficulty::Staged(s) => s.index(),
            Difficulty::Continuous(_) => 0,
        }
    }

    /// The value persisted as the best: distance score or campaign wealth
    pub fn final_value(&self) -> u64 {
        match self.kind() {
            GameKind::Runner => self.ledger.display_score(),
            GameKind::Quest => self.ledger.campaign_wealth(),
        }
    }

    /// Outcome screens accept input only after the display delay
    pub fn can_continue(&self) -> bool {
        self.phase_ticks >= self.rules.outcome_delay_ticks
    }

    fn set_phase(&mut self, to: SessionPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.phase_ticks = 0.0;
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    /// Start a fresh run (runner) or campaign from level 1 (quest)
    pub fn start(&mut self) {
        self.ledger.reset_run(self.rules.start_lives);
        self.difficulty.reset();
        self.night = false;
        self.enter_active();
    }

    /// Start a fresh campaign at a level no higher than the unlocked one
    pub fn start_at_level(&mut self, index: usize) {
        self.ledger.reset_run(self.rules.start_lives);
        self.difficulty.reset();
        if let Difficulty::Staged(staged) = &mut self.difficulty {
            staged.select(index.min(self.highest_unlocked));
        }
        self.enter_active();
    }

    /// Reset per-run state and begin simulating the current level
    fn enter_active(&mut self) {
        self.entities.clear();
        self.particles.clear();
        self.ledger.reset_level();
        self.ledger.flash_ticks = 0.0;
        self.player.start();

        if let (Difficulty::Staged(staged), ModeRules::Quest(quest)) =
            (&self.difficulty, &self.rules.mode)
        {
            let level = staged.current();
            let multi = if level.multi { quest.multi_chance } else { 0.0 };
            self.spawners.primary.reconfigure(
                GapRange::fixed(level.spawn_interval),
                multi,
                &mut self.rng,
            );
            log::info!("Level {} ({}): target {}", level.id, level.name, level.target);
            let id = level.id;
            self.emit(GameEvent::LevelStarted { level: id });
        }
        let factor = self.difficulty.gap_factor();
        self.spawners.reset(factor, &mut self.rng);
        self.set_phase(SessionPhase::Active);
    }

    /// Full reinitialisation back to the menu; the best value survives
    pub fn reset(&mut self) {
        self.entities.clear();
        self.particles.clear();
        self.ledger.reset_run(self.rules.start_lives);
        self.difficulty.reset();
        self.player.reset();
        self.night = false;
        let factor = self.difficulty.gap_factor();
        self.spawners.reset(factor, &mut self.rng);
        self.set_phase(SessionPhase::Menu);
    }

    /// Offer the final value to the ledger's best
    fn record_final(&mut self) -> u64 {
        let value = self.final_value();
        if self.ledger.record_best(value) {
            log::info!("New best: {}", value);
            self.emit(GameEvent::NewBest(value));
        }
        value
    }

    /// Last life lost
    pub(crate) fn lose(&mut self) {
        self.player.die();
        let final_value = self.record_final();
        self.emit(GameEvent::GameOver { final_value });
        self.set_phase(SessionPhase::Lost);
    }

    /// Level target reached
    pub(crate) fn win(&mut self) {
        let index = self.level_index();
        let level = self.level().map_or(0, |l| l.id);
        self.ledger.bank_level();
        self.ledger.restore_lives();
        self.player.status.clear();
        self.emit(GameEvent::LevelCleared { level });

        let is_final = match &self.difficulty {
            Difficulty::Staged(s) => s.is_final(),
            Difficulty::Continuous(_) => false,
        };
        if is_final {
            self.highest_unlocked = index;
            let final_value = self.record_final();
            self.emit(GameEvent::Victory { final_value });
            self.set_phase(SessionPhase::Ending);
        } else {
            self.highest_unlocked = self.highest_unlocked.max(index + 1);
            self.set_phase(SessionPhase::Won);
        }
    }

    /// Move from the win screen into the next level
    fn next_level(&mut self) {
        if let Difficulty::Staged(staged) = &mut self.difficulty {
            staged.advance();
        }
        self.enter_active();
    }

    /// Leave an active run for the menu, keeping the best value
    fn abandon(&mut self) {
        self.record_final();
        self.reset();
    }

    /// Confirm/continue input outside the active phase
    pub fn handle_action(&mut self) {
        match self.phase {
            SessionPhase::Menu => self.start(),
            SessionPhase::Instructions => self.set_phase(SessionPhase::Menu),
            SessionPhase::LevelSelect => self.start_at_level(self.selected_level),
            SessionPhase::Active => {}
            SessionPhase::Won if self.can_continue() => self.next_level(),
            SessionPhase::Lost | SessionPhase::Ending if self.can_continue() => self.start(),
            SessionPhase::Won | SessionPhase::Lost | SessionPhase::Ending => {}
        }
    }

    /// Back/escape input
    pub fn handle_back(&mut self) {
        match self.phase {
            SessionPhase::Menu => {}
            SessionPhase::Instructions | SessionPhase::LevelSelect => {
                self.set_phase(SessionPhase::Menu)
            }
            SessionPhase::Active => self.abandon(),
            _ if self.can_continue() => self.reset(),
            _ => {}
        }
    }

    /// Show the how-to-play screen from the menu
    pub fn open_instructions(&mut self) {
        if self.phase == SessionPhase::Menu {
            self.set_phase(SessionPhase::Instructions);
        }
    }

    /// Show the level picker from the menu (level-based game only)
    pub fn open_level_select(&mut self) {
        if self.phase == SessionPhase::Menu && matches!(self.difficulty, Difficulty::Staged(_)) {
            self.selected_level = self.selected_level.min(self.highest_unlocked);
            self.set_phase(SessionPhase::LevelSelect);
        }
    }

    /// Move the level-select highlight by `delta`, within the unlocked range
    pub fn move_selection(&mut self, delta: i32) {
        let max = self.highest_unlocked as i32;
        self.selected_level = (self.selected_level as i32 + delta).clamp(0, max) as usize;
    }

    /// Read-only view for rendering and telemetry
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            phase_ticks: self.phase_ticks,
            can_continue: !self.phase.is_outcome() || self.can_continue(),
            player: &self.player,
            entities: &self.entities,
            particles: &self.particles,
            decorations: &self.decorations,
            score: self.ledger.display_score(),
            score_visible: self.ledger.score_visible(),
            wealth: self.ledger.wealth,
            campaign_wealth: self.ledger.campaign_wealth(),
            lives: self.ledger.lives,
            max_lives: self.ledger.max_lives,
            combo: self.ledger.combo,
            multiplier: self.ledger.multiplier(),
            best: self.ledger.best(),
            level: self.level(),
            selected_level: self.selected_level,
            highest_unlocked: self.highest_unlocked,
            speed: self.difficulty.speed(),
            night: self.night,
            width: self.rules.width,
            height: self.rules.height,
            ground_y: self.rules.ground_y,
        }
    }
}

/// Settled post-tick view of a session; never mutates
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub phase: SessionPhase,
    pub phase_ticks: f32,
    /// Continue input would be accepted now
    pub can_continue: bool,
    pub player: &'a Player,
    pub entities: &'a [Entity],
    pub particles: &'a [Particle],
    pub decorations: &'a [Decoration],
    pub score: u64,
    /// False during the off half of a milestone flash
    pub score_visible: bool,
    pub wealth: u64,
    pub campaign_wealth: u64,
    pub lives: u8,
    pub max_lives: u8,
    pub combo: u32,
    pub multiplier: f32,
    pub best: u64,
    pub level: Option<&'a LevelDef>,
    pub selected_level: usize,
    pub highest_unlocked: usize,
    pub speed: f32,
    pub night: bool,
    pub width: f32,
    pub height: f32,
    pub ground_y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player::Stance;

    fn quest() -> Session {
        Session::new(Ruleset::quest(), 42)
    }

    fn wait_outcome(session: &mut Session) {
        session.phase_ticks = session.rules.outcome_delay_ticks;
    }

    #[test]
    fn test_new_session_starts_in_menu() {
        let s = Session::new(Ruleset::runner(), 1);
        assert_eq!(s.phase, SessionPhase::Menu);
        assert_eq!(s.player.stance, Stance::Idle);
        assert!(s.entities.is_empty());
        assert!(s.decorations.iter().any(|d| d.kind == DecorationKind::Moon));
    }

    #[test]
    fn test_start_enters_active_and_emits() {
        let mut s = quest();
        s.handle_action();
        assert_eq!(s.phase, SessionPhase::Active);
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::LevelStarted { level: 1 }));
        assert!(events.contains(&GameEvent::PhaseChanged {
            from: SessionPhase::Menu,
            to: SessionPhase::Active
        }));
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_outcome_delay_gates_continue() {
        let mut s = quest();
        s.start();
        s.ledger.lives = 0;
        s.lose();
        assert_eq!(s.phase, SessionPhase::Lost);
        s.handle_action();
        assert_eq!(s.phase, SessionPhase::Lost);
        wait_outcome(&mut s);
        s.handle_action();
        assert_eq!(s.phase, SessionPhase::Active);
        assert_eq!(s.ledger.lives, 3);
    }

    #[test]
    fn test_win_restores_lives_and_advances() {
        let mut s = quest();
        s.start();
        s.ledger.lives = 1;
        s.ledger.credit(15);
        s.win();
        assert_eq!(s.phase, SessionPhase::Won);
        assert_eq!(s.ledger.lives, 3);
        assert_eq!(s.ledger.banked, 15);
        assert_eq!(s.highest_unlocked, 1);

        wait_outcome(&mut s);
        s.handle_action();
        assert_eq!(s.phase, SessionPhase::Active);
        assert_eq!(s.target(), Some(35));
        assert_eq!(s.ledger.wealth, 0);
        assert_eq!(s.ledger.campaign_wealth(), 15);
    }

    #[test]
    fn test_final_level_goes_to_ending() {
        let mut s = quest();
        s.highest_unlocked = 6;
        s.start_at_level(6);
        assert_eq!(s.target(), Some(1000));
        s.ledger.credit(1000);
        s.win();
        assert_eq!(s.phase, SessionPhase::Ending);
        assert_eq!(s.ledger.best(), 1000);
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::Victory { final_value: 1000 }));

        wait_outcome(&mut s);
        s.handle_action();
        assert_eq!(s.phase, SessionPhase::Active);
        assert_eq!(s.target(), Some(15));
    }

    #[test]
    fn test_level_select_respects_unlocks() {
        let mut s = quest();
        s.open_level_select();
        assert_eq!(s.phase, SessionPhase::LevelSelect);
        s.move_selection(3);
        assert_eq!(s.selected_level, 0);
        s.highest_unlocked = 2;
        s.move_selection(3);
        assert_eq!(s.selected_level, 2);
        s.handle_action();
        assert_eq!(s.target(), Some(60));
    }

    #[test]
    fn test_runner_has_no_level_select() {
        let mut s = Session::new(Ruleset::runner(), 3);
        s.open_level_select();
        assert_eq!(s.phase, SessionPhase::Menu);
        s.open_instructions();
        assert_eq!(s.phase, SessionPhase::Instructions);
        s.handle_back();
        assert_eq!(s.phase, SessionPhase::Menu);
    }

    #[test]
    fn test_short_runner_arena_builds() {
        let mut rules = Ruleset::runner();
        rules.ground_y = 5.0;
        assert!(rules.validate().is_ok());
        let s = Session::new(rules, 4);
        let stars: Vec<_> = s
            .decorations
            .iter()
            .filter(|d| d.kind == DecorationKind::Star)
            .collect();
        assert!(!stars.is_empty());
        assert!(stars.iter().all(|d| d.pos.y >= 5.0 && d.pos.y < 6.0));
    }

    #[test]
    fn test_reset_keeps_best() {
        let mut s = Session::new(Ruleset::runner(), 3).with_best(250);
        s.start();
        s.ledger.score = 90.0;
        s.reset();
        assert_eq!(s.phase, SessionPhase::Menu);
        assert_eq!(s.ledger.best(), 250);
        assert_eq!(s.ledger.score, 0.0);
    }

    #[test]
    fn test_particle_cap_drops_oldest() {
        let mut s = quest();
        s.max_particles = 2;
        for i in 0..3 {
            s.push_particle(Particle::text(Vec2::ZERO, format!("{i}"), 0));
        }
        assert_eq!(s.particles.len(), 2);
        assert!(matches!(
            &s.particles[0].style,
            crate::sim::entity::ParticleStyle::Text { label, .. } if label == "1"
        ));
    }

    #[test]
    fn test_empty_level_table_falls_back() {
        let mut rules = Ruleset::quest();
        if let ModeRules::Quest(q) = &mut rules.mode {
            q.levels.clear();
        }
        let s = Session::new(rules, 1);
        assert_eq!(s.target(), Some(15));
    }
}
