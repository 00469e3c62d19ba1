//! Per-frame simulation step
//!
//! Advances a [`Session`] by one frame of `scale` nominal ticks. Within a
//! tick the order is fixed: cosmetics, input, player physics, entity motion,
//! spawning, contact resolution, outcome checks, cleanup, then score and
//! difficulty progression.

use glam::Vec2;
use rand::Rng;

use super::collision::{Outcome, resolve_contacts};
use super::difficulty::LevelDef;
use super::entity::{
    BirdAltitude, Currency, Decoration, DecorationKind, EntityKind, Fate, HazardKind, Motion,
    ObstacleKind, ObstacleShape, Particle,
};
use super::rules::{GameKind, ModeRules, QuestRules};
use super::state::{GameEvent, Session, SessionPhase};
use super::timestep::MAX_SCALE;

/// Sampled input for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    /// Jump / confirm (one-shot)
    pub action: bool,
    /// Duck (held)
    pub duck: bool,
    /// Back / escape (one-shot)
    pub back: bool,
    /// Idle/demo mode - AI plays the game
    pub idle_mode: bool,
}

const GOLD: u32 = 0xFFD700;
const RED: u32 = 0xFF4444;
const GREEN: u32 = 0x44FF88;
const CYAN: u32 = 0x44DDFF;
const FIREWORK_COLORS: [u32; 5] = [0xFF5555, 0xFFD700, 0x55FF55, 0x55AAFF, 0xFF55FF];

/// Chance per tick of a firework burst on the ending screen
const FIREWORK_CHANCE: f32 = 0.14;
const FIREWORK_SPARKS: usize = 12;

/// Largest scale integrated in one substep
const MAX_STEP: f32 = 1.0;
/// Overshoot of a whole step that is folded into it
const STEP_EPSILON: f32 = 1e-4;

/// Advance the session by one frame of `scale` nominal ticks.
///
/// Long frames are split into steps of at most one nominal tick so motion
/// never skips past a contact. One-shot inputs apply to the first step only.
pub fn tick(session: &mut Session, input: &TickInput, scale: f32) {
    let scale = if scale.is_finite() {
        scale.clamp(0.0, MAX_SCALE)
    } else {
        0.0
    };
    session.time_ticks += 1;

    let mut input = *input;
    let mut remaining = scale;
    loop {
        // A sliver past a whole step rides along with the last one
        let step_scale = if remaining <= MAX_STEP + STEP_EPSILON {
            remaining
        } else {
            MAX_STEP
        };
        step(session, &input, step_scale);
        remaining -= step_scale;
        if remaining <= 0.0 {
            break;
        }
        input.action = false;
        input.back = false;
    }
}

/// One substep of at most `MAX_STEP` nominal ticks
fn step(session: &mut Session, input: &TickInput, scale: f32) {
    session.phase_ticks += scale;

    let mut input = *input;
    if input.idle_mode {
        autopilot(session, &mut input);
    }

    update_cosmetics(session, scale);

    if session.phase != SessionPhase::Active {
        handle_menu_input(session, &input);
        return;
    }
    if input.back {
        session.handle_back();
        return;
    }

    // Player
    if session.player.apply_input(&input) {
        session.emit(GameEvent::Jumped);
    }
    session.player.integrate(scale);

    // Entities
    let speed = session.difficulty.speed();
    let height = session.rules.height;
    for entity in session.entities.iter_mut().filter(|e| e.is_active()) {
        entity.advance(scale, speed);
        if entity.is_past(height) {
            entity.retire(Fate::Offscreen);
        }
    }

    // Spawning
    match session.kind() {
        GameKind::Runner => spawn_runner(session, scale),
        GameKind::Quest => spawn_quest(session, scale),
    }

    // Contacts
    let multiplier_before = session.ledger.multiplier();
    let target = session.target();
    let report = resolve_contacts(
        &mut session.player,
        &mut session.entities,
        &mut session.ledger,
        &session.rules.contact,
        target,
    );
    for contact in &report.contacts {
        contact_feedback(session, contact.pos, contact.outcome);
    }
    let multiplier = session.ledger.multiplier();
    if multiplier > multiplier_before {
        session.emit(GameEvent::ComboUp { multiplier });
        let pos = session.player.center() - Vec2::new(0.0, 40.0);
        session.push_particle(Particle::text(pos, format!("COMBO x{multiplier}"), GOLD));
    }

    // Outcome: an exhausted life counter wins over a reached target
    if report.lives_exhausted {
        session.lose();
    } else if report.target_reached {
        session.win();
    }

    session.entities.retain(|e| e.is_active());

    if session.phase != SessionPhase::Active {
        return;
    }

    if let ModeRules::Runner(runner) = &session.rules.mode {
        let (per_tick, milestone_step, night_step) =
            (runner.score_per_tick, runner.milestone_step, runner.night_step);
        if let Some(milestone) = session
            .ledger
            .add_distance(per_tick * scale as f64, milestone_step)
        {
            log::debug!("Milestone {}", milestone);
            session.emit(GameEvent::Milestone(milestone));
        }
        let night = night_step > 0 && (session.ledger.display_score() / night_step) % 2 == 1;
        if night != session.night {
            session.night = night;
            log::info!("Night mode {}", if night { "on" } else { "off" });
            session.emit(GameEvent::NightToggled { night });
        }
    }
    session.difficulty.advance(scale);
}

/// Particles, flash timers and scenery. Runs in every phase.
fn update_cosmetics(session: &mut Session, scale: f32) {
    for particle in &mut session.particles {
        particle.update(scale);
    }
    session.particles.retain(|p| !p.is_dead());
    session.ledger.tick_flash(scale);

    let active = session.phase == SessionPhase::Active;
    let speed = session.difficulty.speed();
    let width = session.rules.width;
    let night = session.night;
    for decoration in &mut session.decorations {
        match decoration.kind {
            DecorationKind::Star => {
                decoration.twinkle += 0.05 * scale;
                if active && night {
                    decoration.pos.x -= 0.1 * speed * scale;
                    if decoration.pos.x < 0.0 {
                        decoration.pos.x += width;
                    }
                }
            }
            DecorationKind::Cloud if active => {
                decoration.pos.x -= (1.0 + 0.15 * speed) * scale;
            }
            DecorationKind::Cloud | DecorationKind::Moon => {}
        }
    }
    session
        .decorations
        .retain(|d| d.kind != DecorationKind::Cloud || d.pos.x > -d.size - 10.0);

    if session.phase == SessionPhase::Ending {
        launch_fireworks(session, scale);
    }
}

fn launch_fireworks(session: &mut Session, scale: f32) {
    if session.rng.random::<f32>() >= FIREWORK_CHANCE * scale.min(1.0) {
        return;
    }
    let width = session.rules.width;
    let height = session.rules.height;
    let origin = Vec2::new(
        session.rng.random_range(40.0..(width - 40.0).max(41.0)),
        session.rng.random_range(60.0..(height * 0.5).max(61.0)),
    );
    let color = FIREWORK_COLORS[session.rng.random_range(0..FIREWORK_COLORS.len())];
    for i in 0..FIREWORK_SPARKS {
        let angle = i as f32 / FIREWORK_SPARKS as f32 * std::f32::consts::TAU;
        let speed: f32 = session.rng.random_range(1.5..4.0);
        let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
        session.push_particle(Particle::spark(origin, vel, color));
    }
}

/// Menu, level select and outcome screens
fn handle_menu_input(session: &mut Session, input: &TickInput) {
    let horizontal = input.move_right as i8 - input.move_left as i8;
    let pressed = horizontal != 0 && horizontal != session.prev_horizontal;
    session.prev_horizontal = horizontal;

    if input.back {
        session.handle_back();
        return;
    }
    if session.phase == SessionPhase::LevelSelect && pressed {
        session.move_selection(horizontal as i32);
    }
    if input.action {
        session.handle_action();
    }
}

/// Events and floating text for one resolved contact
fn contact_feedback(session: &mut Session, pos: Vec2, outcome: Outcome) {
    let (label, color) = match outcome {
        Outcome::Damaged { lives_left } => {
            session.emit(GameEvent::Hurt { lives_left });
            ("-1".to_string(), RED)
        }
        Outcome::Redirected { earned } => {
            session.emit(GameEvent::Shielded { earned });
            (format!("+{earned}"), CYAN)
        }
        Outcome::Collected {
            currency, earned, ..
        } => {
            session.emit(GameEvent::Collected { currency, earned });
            if currency == Currency::Coin {
                let per_life = match &session.rules.mode {
                    ModeRules::Runner(runner) => runner.coins_per_life,
                    ModeRules::Quest(_) => 0,
                };
                if session.ledger.count_coin(per_life) {
                    log::info!("Extra life ({} lives)", session.ledger.lives);
                    session.emit(GameEvent::ExtraLife);
                    session.push_particle(Particle::text(pos, "+1 UP", GREEN));
                }
            }
            (format!("+{earned}"), GOLD)
        }
        Outcome::Healed { .. } => {
            session.emit(GameEvent::Healed);
            ("+1 LIFE".to_string(), GREEN)
        }
        Outcome::HealConverted { earned } => {
            session.emit(GameEvent::Healed);
            (format!("+{earned}"), GREEN)
        }
        Outcome::PowerUp(kind) => {
            log::info!("Power-up {:?}", kind);
            session.emit(GameEvent::PowerUp(kind));
            (kind.label().to_string(), CYAN)
        }
        Outcome::Cleared { count, earned } => {
            log::info!("Cleared {} entities for {}", count, earned);
            session.emit(GameEvent::Cleared { count, earned });
            (format!("CLEAR! +{earned}"), CYAN)
        }
    };
    session.push_particle(Particle::text(pos, label, color));
}

/// Obstacles, coins and clouds for the endless runner
fn spawn_runner(session: &mut Session, scale: f32) {
    let ModeRules::Runner(runner) = &session.rules.mode else {
        return;
    };
    let speed = session.difficulty.speed();
    let factor = session.difficulty.gap_factor();
    let distance = speed * scale;
    let width = session.rules.width;
    let ground = session.rules.ground_y;
    let spawn_x = width + runner.spawn_margin;
    let mut spawns: Vec<(EntityKind, Vec2)> = Vec::new();

    let obstacles = session
        .spawners
        .primary
        .advance(distance, factor, &mut session.rng);
    for _ in 0..obstacles {
        let table = if session.ledger.score >= runner.bird_score {
            &runner.obstacles_with_birds
        } else {
            &runner.obstacles
        };
        let kind = match table.draw(&mut session.rng) {
            Some(ObstacleShape::CactusSmall) | None => ObstacleKind::CactusSmall,
            Some(ObstacleShape::CactusLarge) => ObstacleKind::CactusLarge,
            Some(ObstacleShape::CactusGroup) => ObstacleKind::CactusGroup,
            Some(ObstacleShape::Bird) => ObstacleKind::Bird(
                runner
                    .bird_altitudes
                    .draw(&mut session.rng)
                    .unwrap_or(BirdAltitude::Low),
            ),
        };
        let kind = EntityKind::Obstacle(kind);
        let y = match kind {
            EntityKind::Obstacle(ObstacleKind::Bird(altitude)) => ground - altitude.lift(),
            other => ground - other.size().y,
        };
        spawns.push((kind, Vec2::new(spawn_x, y)));
    }

    if let Some(coins) = session.spawners.coins.as_mut() {
        let count = coins.advance(distance, 1.0, &mut session.rng);
        for _ in 0..count {
            let lift = runner.coin_lifts.draw(&mut session.rng).unwrap_or(22.0);
            spawns.push((
                EntityKind::Currency(Currency::Coin),
                Vec2::new(spawn_x, ground - lift),
            ));
        }
    }

    let mut clouds = Vec::new();
    if let Some(spawner) = session.spawners.clouds.as_mut() {
        let count = spawner.advance((1.0 + 0.15 * speed) * scale, 1.0, &mut session.rng);
        for _ in 0..count {
            clouds.push(Decoration {
                kind: DecorationKind::Cloud,
                pos: Vec2::new(width + 10.0, session.rng.random_range(20.0..80.0)),
                size: session.rng.random_range(40.0..70.0),
                twinkle: 0.0,
            });
        }
    }
    session.decorations.extend(clouds);

    for (kind, pos) in spawns {
        session.spawn_entity(kind, pos, Motion::Scroll, 0.0);
    }
}

/// Falling items for the level game
fn spawn_quest(session: &mut Session, scale: f32) {
    let ModeRules::Quest(quest) = &session.rules.mode else {
        return;
    };
    let Some(level) = session.difficulty.level() else {
        return;
    };
    let width = session.rules.width;
    let full_health = session.ledger.lives >= session.ledger.max_lives;
    let mut spawns = Vec::new();

    let count = session
        .spawners
        .primary
        .advance(scale, 1.0, &mut session.rng);
    for _ in 0..count {
        let kind = roll_quest_kind(quest, level, full_health, &mut session.rng);
        let rng = &mut session.rng;
        let x = if width - quest.spawn_margin > quest.spawn_margin {
            rng.random_range(quest.spawn_margin..width - quest.spawn_margin)
        } else {
            width * 0.5
        };
        let vel = Vec2::new(
            (rng.random::<f32>() - 0.5) * quest.drift,
            level.fall_speed + rng.random::<f32>() * quest.fall_jitter,
        );
        let spin = (rng.random::<f32>() - 0.5) * 0.1;
        spawns.push((kind, Vec2::new(x, quest.spawn_y), Motion::Drift { vel }, spin));
    }

    for (kind, pos, motion, spin) in spawns {
        session.spawn_entity(kind, pos, motion, spin);
    }
}

/// Pick what falls next: power-up, hazard, or a weighted item
fn roll_quest_kind<R: Rng + ?Sized>(
    quest: &QuestRules,
    level: &LevelDef,
    full_health: bool,
    rng: &mut R,
) -> EntityKind {
    if level.power_ups && rng.random::<f32>() < quest.power_up_chance {
        if let Some(power) = quest.power_ups.draw(rng) {
            return EntityKind::PowerUp(power);
        }
    }
    if rng.random::<f32>() < level.hazard_chance {
        let bottle = level.bottles && rng.random::<f32>() < quest.bottle_share;
        return EntityKind::Hazard(if bottle {
            HazardKind::Bottle
        } else {
            HazardKind::Bomb
        });
    }
    let fallback = EntityKind::Currency(Currency::Yuan1);
    let kind = quest.items.draw(rng).unwrap_or(fallback);
    if kind == EntityKind::Heart && full_health {
        // One redraw; a second heart stands
        return quest.items.draw(rng).unwrap_or(fallback);
    }
    kind
}

/// Demo-mode input: confirm every screen, dodge and collect while active
fn autopilot(session: &Session, input: &mut TickInput) {
    match session.phase {
        SessionPhase::Menu | SessionPhase::Instructions | SessionPhase::LevelSelect => {
            input.action = true;
        }
        SessionPhase::Won | SessionPhase::Lost | SessionPhase::Ending => {
            input.action = session.can_continue();
        }
        SessionPhase::Active => match session.kind() {
            GameKind::Runner => runner_autopilot(session, input),
            GameKind::Quest => quest_autopilot(session, input),
        },
    }
}

fn runner_autopilot(session: &Session, input: &mut TickInput) {
    let player_box = session.player.hitbox();
    let speed = session.difficulty.speed();
    input.action = false;
    input.duck = false;

    let threat = session
        .entities
        .iter()
        .filter(|e| e.is_active() && e.kind.is_harmful())
        .filter(|e| e.hitbox().right() > player_box.x)
        .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x));
    let Some(threat) = threat else {
        return;
    };
    let gap = threat.hitbox().x - player_box.right();
    match threat.kind {
        EntityKind::Obstacle(ObstacleKind::Bird(BirdAltitude::High)) => {
            input.duck = session.player.on_ground && gap < speed * 6.0;
        }
        _ => input.action = gap < speed * 7.0,
    }
}

fn quest_autopilot(session: &Session, input: &mut TickInput) {
    let center = session.player.center();
    input.move_left = false;
    input.move_right = false;
    input.action = false;

    let protected = session.player.status.redirects_harm();
    let danger = session
        .entities
        .iter()
        .filter(|e| e.is_active() && e.kind.is_harmful() && !protected)
        .filter(|e| e.pos.y < center.y + 20.0 && e.pos.y > center.y - 220.0)
        .filter(|e| (e.pos.x - center.x).abs() < 45.0)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
    if let Some(hazard) = danger {
        if hazard.pos.x > center.x {
            input.move_left = true;
        } else {
            input.move_right = true;
        }
        return;
    }

    let target = session
        .entities
        .iter()
        .filter(|e| e.is_active() && (!e.kind.is_harmful() || protected))
        .filter(|e| e.pos.y < center.y + 20.0)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
    if let Some(item) = target {
        let dx = item.pos.x - center.x;
        input.move_right = dx > 8.0;
        input.move_left = dx < -8.0;
    }
}
