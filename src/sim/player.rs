//! Player actor: locomotion, physics integration and timed status effects

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rules::{Horizontal, PlayerRules};
use super::tick::TickInput;
use crate::Rect;

/// Mutually exclusive locomotion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stance {
    /// Standing still (pre-start, or no horizontal motion)
    #[default]
    Idle,
    Running,
    Jumping,
    Ducking,
    Dead,
}

/// Timed status effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    /// Post-hit grace window; harmful contact is ignored
    Hurt,
    /// Harmful contact is converted to currency
    Invincible,
    /// Movement at half speed
    Slowed,
    /// No movement; overrides `Slowed`
    Stunned,
    /// Currency multiplied and harmful contact converted
    Buffed,
}

/// Remaining duration (ticks) of each status effect; 0 means inactive
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub hurt: f32,
    pub invincible: f32,
    pub slowed: f32,
    pub stunned: f32,
    pub buffed: f32,
}

/// Movement multiplier while slowed
const SLOW_FACTOR: f32 = 0.5;

impl StatusEffects {
    fn slot(&mut self, kind: StatusKind) -> &mut f32 {
        match kind {
            StatusKind::Hurt => &mut self.hurt,
            StatusKind::Invincible => &mut self.invincible,
            StatusKind::Slowed => &mut self.slowed,
            StatusKind::Stunned => &mut self.stunned,
            StatusKind::Buffed => &mut self.buffed,
        }
    }

    /// Begin or extend an effect. A shorter re-application never cuts an
    /// active effect short.
    pub fn apply(&mut self, kind: StatusKind, ticks: f32) {
        if !ticks.is_finite() || ticks <= 0.0 {
            return;
        }
        let slot = self.slot(kind);
        *slot = slot.max(ticks);
    }

    pub fn remaining(&self, kind: StatusKind) -> f32 {
        match kind {
            StatusKind::Hurt => self.hurt,
            StatusKind::Invincible => self.invincible,
            StatusKind::Slowed => self.slowed,
            StatusKind::Stunned => self.stunned,
            StatusKind::Buffed => self.buffed,
        }
    }

    #[inline]
    pub fn is_active(&self, kind: StatusKind) -> bool {
        self.remaining(kind) > 0.0
    }

    /// Count every effect down toward zero
    pub fn tick(&mut self, scale: f32) {
        for t in [
            &mut self.hurt,
            &mut self.invincible,
            &mut self.slowed,
            &mut self.stunned,
            &mut self.buffed,
        ] {
            *t = (*t - scale).max(0.0);
        }
    }

    /// Harmful contact becomes a pickup (invincible or buffed)
    pub fn redirects_harm(&self) -> bool {
        self.invincible > 0.0 || self.buffed > 0.0
    }

    /// Inside the post-hit grace window
    pub fn in_grace(&self) -> bool {
        self.hurt > 0.0
    }

    /// Horizontal speed factor; stun wins over slow
    pub fn movement_factor(&self) -> f32 {
        if self.stunned > 0.0 {
            0.0
        } else if self.slowed > 0.0 {
            SLOW_FACTOR
        } else {
            1.0
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Below this horizontal speed a grounded walker counts as standing
const WALK_THRESHOLD: f32 = 0.3;

/// The single player-controlled actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub stance: Stance,
    pub on_ground: bool,
    pub status: StatusEffects,
    /// -1 facing left, 1 facing right
    pub facing: f32,
    pub anim_timer: f32,
    pub anim_frame: u8,
    /// Horizontal intent sampled this tick (-1, 0, 1)
    intent: f32,
    duck_held: bool,
    rules: PlayerRules,
    ground_y: f32,
    arena_width: f32,
}

impl Player {
    pub fn new(rules: PlayerRules, ground_y: f32, arena_width: f32) -> Self {
        let pos = Vec2::new(rules.start_x, ground_y - rules.height);
        Self {
            pos,
            vel: Vec2::ZERO,
            stance: Stance::Idle,
            on_ground: true,
            status: StatusEffects::default(),
            facing: 1.0,
            anim_timer: 0.0,
            anim_frame: 0,
            intent: 0.0,
            duck_held: false,
            rules,
            ground_y,
            arena_width,
        }
    }

    pub fn rules(&self) -> &PlayerRules {
        &self.rules
    }

    /// Back to the canonical spawn position with no effects
    pub fn reset(&mut self) {
        self.pos = Vec2::new(self.rules.start_x, self.ground_y - self.rules.height);
        self.vel = Vec2::ZERO;
        self.stance = Stance::Idle;
        self.on_ground = true;
        self.status.clear();
        self.facing = 1.0;
        self.anim_timer = 0.0;
        self.anim_frame = 0;
        self.intent = 0.0;
        self.duck_held = false;
    }

    /// Enter the run: reset and start moving
    pub fn start(&mut self) {
        self.reset();
        if self.rules.horizontal == Horizontal::Fixed {
            self.stance = Stance::Running;
        }
    }

    pub fn die(&mut self) {
        self.stance = Stance::Dead;
        self.intent = 0.0;
        self.duck_held = false;
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.stance == Stance::Dead
    }

    /// Begin or extend a timed effect
    pub fn apply_status(&mut self, kind: StatusKind, ticks: f32) {
        self.status.apply(kind, ticks);
    }

    /// Sample this tick's input. Returns true if a jump started.
    ///
    /// Left and right together cancel out. The action flag is one-shot: it
    /// only starts a jump when grounded and not stunned.
    pub fn apply_input(&mut self, input: &TickInput) -> bool {
        if self.is_dead() {
            return false;
        }

        self.intent = match self.rules.horizontal {
            Horizontal::Fixed => 0.0,
            Horizontal::Wrap => (input.move_right as i8 - input.move_left as i8) as f32,
        };
        if self.intent != 0.0 {
            self.facing = self.intent;
        }

        self.duck_held = input.duck && self.rules.duck_hitbox.is_some();
        if self.on_ground && self.stance != Stance::Idle {
            if self.duck_held {
                self.stance = Stance::Ducking;
            } else if self.stance == Stance::Ducking {
                self.stance = Stance::Running;
            }
        }

        if input.action && self.on_ground && self.status.stunned <= 0.0 {
            self.vel.y = self.rules.jump_force;
            self.on_ground = false;
            self.stance = Stance::Jumping;
            return true;
        }
        false
    }

    /// Advance physics by `scale` ticks.
    ///
    /// Vertical position is clamped so the player never sinks below the
    /// ground line.
    pub fn integrate(&mut self, scale: f32) {
        self.status.tick(scale);

        if self.rules.horizontal == Horizontal::Wrap {
            let factor = self.status.movement_factor();
            if self.intent != 0.0 && factor > 0.0 {
                self.vel.x = self.intent * self.rules.move_speed * factor;
            } else {
                self.vel.x *= self.rules.friction.powf(scale);
                if factor == 0.0 {
                    self.vel.x = 0.0;
                }
            }
            self.pos.x += self.vel.x * scale;
            if self.pos.x > self.arena_width {
                self.pos.x = -self.rules.width;
            } else if self.pos.x < -self.rules.width {
                self.pos.x = self.arena_width;
            }
        }

        if !self.on_ground {
            self.vel.y += self.rules.gravity * scale;
            if self.duck_held {
                self.vel.y += self.rules.fast_fall * scale;
            }
        }
        self.pos.y += self.vel.y * scale;

        let rest_y = self.ground_y - self.rules.height;
        if self.pos.y >= rest_y {
            self.pos.y = rest_y;
            self.vel.y = 0.0;
            if !self.on_ground {
                self.on_ground = true;
                if self.stance == Stance::Jumping {
                    self.stance = if self.duck_held {
                        Stance::Ducking
                    } else {
                        Stance::Running
                    };
                }
            }
        }

        if self.rules.horizontal == Horizontal::Wrap && self.on_ground && !self.is_dead() {
            self.stance = if self.vel.x.abs() > WALK_THRESHOLD {
                Stance::Running
            } else {
                Stance::Idle
            };
        }

        self.animate(scale);
    }

    fn animate(&mut self, scale: f32) {
        if !matches!(self.stance, Stance::Running | Stance::Ducking) {
            return;
        }
        self.anim_timer += scale;
        if self.rules.anim_ticks > 0.0 && self.anim_timer >= self.rules.anim_ticks {
            self.anim_timer = 0.0;
            self.anim_frame = (self.anim_frame + 1) % self.rules.anim_frames.max(1);
        }
    }

    /// World-space hitbox for the current stance
    pub fn hitbox(&self) -> Rect {
        let local = match (self.stance, self.rules.duck_hitbox) {
            (Stance::Ducking, Some(duck)) => duck,
            _ => self.rules.hitbox,
        };
        local.at(self.pos)
    }

    /// Centre of the visual footprint
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::new(self.rules.width, self.rules.height) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rules::Ruleset;
    use proptest::prelude::*;

    fn runner() -> Player {
        let rules = Ruleset::runner();
        let mut p = Player::new(rules.player, rules.ground_y, rules.width);
        p.start();
        p
    }

    fn walker() -> Player {
        let rules = Ruleset::quest();
        let mut p = Player::new(rules.player, rules.ground_y, rules.width);
        p.start();
        p
    }

    fn jump() -> TickInput {
        TickInput {
            action: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_jump_only_from_ground() {
        let mut p = runner();
        assert!(p.apply_input(&jump()));
        assert_eq!(p.stance, Stance::Jumping);
        assert_eq!(p.vel.y, -12.0);
        p.integrate(1.0);
        assert!(!p.apply_input(&jump()));
    }

    #[test]
    fn test_jump_lands_back_running() {
        let mut p = runner();
        p.apply_input(&jump());
        let mut peak = p.pos.y;
        for _ in 0..120 {
            p.apply_input(&TickInput::default());
            p.integrate(1.0);
            peak = peak.min(p.pos.y);
        }
        assert!(p.on_ground);
        assert_eq!(p.stance, Stance::Running);
        assert_eq!(p.pos.y, 175.0 - 47.0);
        assert!(peak < 128.0 - 100.0);
    }

    #[test]
    fn test_duck_changes_hitbox() {
        let mut p = runner();
        let standing = p.hitbox();
        p.apply_input(&TickInput {
            duck: true,
            ..Default::default()
        });
        assert_eq!(p.stance, Stance::Ducking);
        let ducking = p.hitbox();
        assert!(ducking.h < standing.h);
        assert!(ducking.w > standing.w);
        p.apply_input(&TickInput::default());
        assert_eq!(p.stance, Stance::Running);
    }

    #[test]
    fn test_duck_in_air_falls_faster() {
        let mut plain = runner();
        let mut fast = runner();
        plain.apply_input(&jump());
        fast.apply_input(&jump());
        let duck = TickInput {
            duck: true,
            ..Default::default()
        };
        for _ in 0..5 {
            plain.apply_input(&TickInput::default());
            plain.integrate(1.0);
            fast.apply_input(&duck);
            fast.integrate(1.0);
        }
        assert!(fast.vel.y > plain.vel.y);
        assert_eq!(fast.stance, Stance::Jumping);
    }

    #[test]
    fn test_left_and_right_cancel() {
        let mut p = walker();
        let x = p.pos.x;
        p.apply_input(&TickInput {
            move_left: true,
            move_right: true,
            ..Default::default()
        });
        p.integrate(1.0);
        assert_eq!(p.pos.x, x);
    }

    #[test]
    fn test_walker_friction_and_wrap() {
        let mut p = walker();
        p.apply_input(&TickInput {
            move_right: true,
            ..Default::default()
        });
        p.integrate(1.0);
        assert_eq!(p.vel.x, 5.5);
        assert_eq!(p.stance, Stance::Running);

        p.apply_input(&TickInput::default());
        p.integrate(1.0);
        assert!((p.vel.x - 5.5 * 0.72).abs() < 1e-4);

        p.pos.x = 389.0;
        p.vel.x = 5.5;
        p.apply_input(&TickInput {
            move_right: true,
            ..Default::default()
        });
        p.integrate(1.0);
        assert_eq!(p.pos.x, -40.0);
    }

    #[test]
    fn test_stun_blocks_movement_and_jump() {
        let mut p = walker();
        p.apply_status(StatusKind::Stunned, 20.0);
        p.apply_status(StatusKind::Slowed, 150.0);
        let x = p.pos.x;
        assert!(!p.apply_input(&TickInput {
            move_left: true,
            action: true,
            ..Default::default()
        }));
        p.integrate(1.0);
        assert_eq!(p.pos.x, x);

        for _ in 0..20 {
            p.integrate(1.0);
        }
        p.apply_input(&TickInput {
            move_left: true,
            ..Default::default()
        });
        p.integrate(1.0);
        assert_eq!(p.vel.x, -5.5 * SLOW_FACTOR);
    }

    #[test]
    fn test_status_counts_down_and_extends() {
        let mut s = StatusEffects::default();
        s.apply(StatusKind::Hurt, 90.0);
        s.apply(StatusKind::Hurt, 10.0);
        assert_eq!(s.hurt, 90.0);
        s.tick(30.0);
        assert_eq!(s.hurt, 60.0);
        s.tick(100.0);
        assert_eq!(s.hurt, 0.0);
        assert!(!s.in_grace());

        s.apply(StatusKind::Buffed, 300.0);
        assert!(s.redirects_harm());
    }

    #[test]
    fn test_dead_player_ignores_input() {
        let mut p = runner();
        p.die();
        assert!(!p.apply_input(&jump()));
        assert_eq!(p.stance, Stance::Dead);
    }

    proptest! {
        #[test]
        fn prop_never_below_ground(
            steps in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>(), 0.0f32..6.0), 1..200),
            quest in any::<bool>(),
        ) {
            let mut p = if quest { walker() } else { runner() };
            let ground = if quest { 600.0 } else { 175.0 };
            for (action, duck, left, scale) in steps {
                p.apply_input(&TickInput { action, duck, move_left: left, ..Default::default() });
                p.integrate(scale);
                prop_assert!(p.pos.y + p.rules().height <= ground + 1e-3);
            }
        }
    }
}
