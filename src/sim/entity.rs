//! Simulated entities: scrolling obstacles, falling items, particles, scenery
//!
//! Every entity variant is a case of [`EntityKind`]; geometry and scoring
//! data hang off the kind so hitboxes are always derivable from position.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Rect;

/// Flight band of a bird obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BirdAltitude {
    /// Must be jumped
    Low,
    /// Clips a standing player
    Medium,
    /// Passes over a running player, duck to be safe
    High,
}

impl BirdAltitude {
    /// Height of the bird's top edge above the ground line
    pub fn lift(self) -> f32 {
        match self {
            BirdAltitude::Low => 30.0,
            BirdAltitude::Medium => 55.0,
            BirdAltitude::High => 80.0,
        }
    }
}

/// Shape drawn from the runner's obstacle table (altitude is drawn separately)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleShape {
    CactusSmall,
    CactusLarge,
    CactusGroup,
    Bird,
}

/// Runner ground/air obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    CactusSmall,
    CactusLarge,
    CactusGroup,
    Bird(BirdAltitude),
}

/// Falling hazards in the quest game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    Bomb,
    Bottle,
}

/// Currency tiers (runner coin plus the quest's money items)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Coin,
    Yuan1,
    Yuan5,
    Yuan10,
    MoneyBag,
    Clover,
}

impl Currency {
    pub fn value(self) -> u32 {
        match self {
            Currency::Coin => 1,
            Currency::Yuan1 => 1,
            Currency::Yuan5 => 5,
            Currency::Yuan10 => 10,
            Currency::MoneyBag => 30,
            Currency::Clover => 50,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Currency::Coin => "coin",
            Currency::Yuan1 => "¥1",
            Currency::Yuan5 => "¥5",
            Currency::Yuan10 => "¥10",
            Currency::MoneyBag => "money bag",
            Currency::Clover => "clover",
        }
    }
}

/// One-shot pickups with population-wide or timed effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Consumes every active entity, converting each to currency
    ClearScreen,
    /// Harm is converted to currency for a while
    Invincibility,
    /// Doubles currency and converts harm for a while
    Fortune,
}

impl PowerUpKind {
    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::ClearScreen => "CLEAR!",
            PowerUpKind::Invincibility => "INVINCIBLE!",
            PowerUpKind::Fortune => "FORTUNE x2!",
        }
    }
}

/// What kind of thing an entity is, with its kind-specific payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle(ObstacleKind),
    Hazard(HazardKind),
    Currency(Currency),
    Heart,
    PowerUp(PowerUpKind),
}

/// How contact with a kind is interpreted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactClass {
    /// Damages the player unless protected; `salvage` is its currency value
    /// when redirected or cleared
    Harmful { salvage: u32 },
    Currency { value: u32 },
    Health,
    PowerUp(PowerUpKind),
}

/// Salvage value of a hazard converted by protection or a clear-screen
const HAZARD_SALVAGE: u32 = 2;

impl EntityKind {
    pub fn class(self) -> ContactClass {
        match self {
            EntityKind::Obstacle(_) => ContactClass::Harmful { salvage: 0 },
            EntityKind::Hazard(_) => ContactClass::Harmful {
                salvage: HAZARD_SALVAGE,
            },
            EntityKind::Currency(c) => ContactClass::Currency { value: c.value() },
            EntityKind::Heart => ContactClass::Health,
            EntityKind::PowerUp(p) => ContactClass::PowerUp(p),
        }
    }

    /// Visual footprint (width, height)
    pub fn size(self) -> Vec2 {
        match self {
            EntityKind::Obstacle(ObstacleKind::CactusSmall) => Vec2::new(20.0, 35.0),
            EntityKind::Obstacle(ObstacleKind::CactusLarge) => Vec2::new(30.0, 50.0),
            EntityKind::Obstacle(ObstacleKind::CactusGroup) => Vec2::new(55.0, 50.0),
            EntityKind::Obstacle(ObstacleKind::Bird(_)) => Vec2::new(53.0, 40.0),
            EntityKind::Currency(Currency::Coin) => Vec2::splat(16.0),
            other => Vec2::splat(other.radius() * 2.0),
        }
    }

    /// Radius of round falling items (0 for boxed runner entities)
    pub fn radius(self) -> f32 {
        match self {
            EntityKind::Hazard(HazardKind::Bomb) => 20.0,
            EntityKind::Hazard(HazardKind::Bottle) => 16.0,
            EntityKind::Currency(Currency::Yuan1) => 14.0,
            EntityKind::Currency(Currency::Yuan5) => 17.0,
            EntityKind::Currency(Currency::Yuan10) => 20.0,
            EntityKind::Currency(Currency::MoneyBag) => 22.0,
            EntityKind::Currency(Currency::Clover) => 22.0,
            EntityKind::Heart => 20.0,
            EntityKind::PowerUp(_) => 18.0,
            EntityKind::Obstacle(_) | EntityKind::Currency(Currency::Coin) => 0.0,
        }
    }

    /// Hitbox relative to the entity position.
    ///
    /// Runner entities are positioned by their top-left corner; falling items
    /// by their centre.
    pub fn hitbox(self) -> Rect {
        match self {
            EntityKind::Obstacle(ObstacleKind::CactusSmall) => Rect::new(2.0, 0.0, 16.0, 35.0),
            EntityKind::Obstacle(ObstacleKind::CactusLarge) => Rect::new(3.0, 0.0, 24.0, 50.0),
            EntityKind::Obstacle(ObstacleKind::CactusGroup) => Rect::new(0.0, 0.0, 55.0, 50.0),
            EntityKind::Obstacle(ObstacleKind::Bird(_)) => Rect::new(5.0, 12.0, 43.0, 18.0),
            EntityKind::Currency(Currency::Coin) => Rect::new(-2.0, -4.0, 20.0, 24.0),
            other => Rect::centered(other.radius()),
        }
    }

    /// Currency this entity yields when swept up by a clear-screen
    pub fn conversion_value(self, heart_bonus: u32) -> u32 {
        match self.class() {
            ContactClass::Harmful { salvage } => salvage,
            ContactClass::Currency { value } => value,
            ContactClass::Health => heart_bonus,
            ContactClass::PowerUp(_) => 0,
        }
    }

    pub fn is_harmful(self) -> bool {
        matches!(self.class(), ContactClass::Harmful { .. })
    }
}

/// How an entity moves each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Scrolls left with the world speed
    Scroll,
    /// Own velocity, independent of world speed
    Drift { vel: Vec2 },
}

/// Terminal state of an entity; leaves `Active` exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fate {
    #[default]
    Active,
    Consumed,
    Offscreen,
}

/// A simulated obstacle, collectible, hazard or power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub motion: Motion,
    pub fate: Fate,
    /// Cosmetic rotation (radians) and spin per tick
    pub rotation: f32,
    pub spin: f32,
    /// Animation phase accumulator (ticks)
    pub anim_timer: f32,
    pub anim_frame: u8,
}

/// Ticks per bird wing flap
const BIRD_FLAP_TICKS: f32 = 8.0;

impl Entity {
    pub fn new(id: u32, kind: EntityKind, pos: Vec2, motion: Motion) -> Self {
        Self {
            id,
            kind,
            pos,
            motion,
            fate: Fate::Active,
            rotation: 0.0,
            spin: 0.0,
            anim_timer: 0.0,
            anim_frame: 0,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.fate == Fate::Active
    }

    /// World-space hitbox
    #[inline]
    pub fn hitbox(&self) -> Rect {
        self.kind.hitbox().at(self.pos)
    }

    /// Move the entity one tick. `world_speed` drives scrolling entities.
    pub fn advance(&mut self, scale: f32, world_speed: f32) {
        match self.motion {
            Motion::Scroll => self.pos.x -= world_speed * scale,
            Motion::Drift { vel } => self.pos += vel * scale,
        }
        self.rotation += self.spin * scale;
        self.anim_timer += scale;
        if matches!(self.kind, EntityKind::Obstacle(ObstacleKind::Bird(_)))
            && self.anim_timer >= BIRD_FLAP_TICKS
        {
            self.anim_timer = 0.0;
            self.anim_frame = (self.anim_frame + 1) % 2;
        }
    }

    /// Whether the entity has left the arena for good
    pub fn is_past(&self, arena_height: f32) -> bool {
        match self.motion {
            Motion::Scroll => self.pos.x < -self.kind.size().x - 10.0,
            Motion::Drift { .. } => self.pos.y > arena_height + 60.0,
        }
    }

    /// Move to a terminal state. Returns false if already retired.
    pub fn retire(&mut self, fate: Fate) -> bool {
        if self.fate != Fate::Active || fate == Fate::Active {
            return false;
        }
        self.fate = fate;
        true
    }
}

/// Visual payload of a particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParticleStyle {
    /// Floating feedback text
    Text { label: String, color: u32 },
    /// Firework spark
    Spark { color: u32 },
}

/// Ephemeral visual feedback (never affects simulation outcome)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub style: ParticleStyle,
    /// Remaining life in ticks, counts down from `max_life`
    pub life: f32,
    pub max_life: f32,
    pub gravity: f32,
    /// Per-tick velocity retention
    pub drag: f32,
}

pub const TEXT_PARTICLE_LIFE: f32 = 60.0;
pub const SPARK_PARTICLE_LIFE: f32 = 45.0;

impl Particle {
    /// Rising feedback text
    pub fn text(pos: Vec2, label: impl Into<String>, color: u32) -> Self {
        Self {
            pos,
            vel: Vec2::new(0.0, -1.8),
            style: ParticleStyle::Text {
                label: label.into(),
                color,
            },
            life: TEXT_PARTICLE_LIFE,
            max_life: TEXT_PARTICLE_LIFE,
            gravity: 0.0,
            drag: 0.96,
        }
    }

    pub fn spark(pos: Vec2, vel: Vec2, color: u32) -> Self {
        Self {
            pos,
            vel,
            style: ParticleStyle::Spark { color },
            life: SPARK_PARTICLE_LIFE,
            max_life: SPARK_PARTICLE_LIFE,
            gravity: 0.05,
            drag: 1.0,
        }
    }

    pub fn update(&mut self, scale: f32) {
        self.pos += self.vel * scale;
        self.vel.y += self.gravity * scale;
        self.vel *= self.drag.powf(scale);
        self.life = (self.life - scale).max(0.0);
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    /// Remaining life as 0-1 (for fading)
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            self.life / self.max_life
        }
    }
}

/// Background scenery kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorationKind {
    Cloud,
    Star,
    Moon,
}

/// Non-interactive scenery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub pos: Vec2,
    pub size: f32,
    /// Twinkle phase (radians)
    pub twinkle: f32,
}

impl Decoration {
    /// Brightness for twinkling stars, 0-1
    pub fn brightness(&self) -> f32 {
        match self.kind {
            DecorationKind::Star => 0.5 + 0.5 * self.twinkle.sin(),
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retire_is_one_way() {
        let mut e = Entity::new(
            1,
            EntityKind::Currency(Currency::Yuan5),
            Vec2::ZERO,
            Motion::Drift { vel: Vec2::Y },
        );
        assert!(e.retire(Fate::Consumed));
        assert!(!e.retire(Fate::Offscreen));
        assert!(!e.retire(Fate::Active));
        assert_eq!(e.fate, Fate::Consumed);
    }

    #[test]
    fn test_hitbox_follows_position() {
        let mut e = Entity::new(
            7,
            EntityKind::Obstacle(ObstacleKind::CactusLarge),
            Vec2::new(850.0, 127.0),
            Motion::Scroll,
        );
        assert_eq!(e.hitbox(), Rect::new(853.0, 127.0, 24.0, 50.0));

        e.advance(2.0, 6.0);
        assert_eq!(e.pos.x, 838.0);
        assert_eq!(e.hitbox().x, 841.0);
    }

    #[test]
    fn test_falling_item_leaves_bottom() {
        let mut e = Entity::new(
            1,
            EntityKind::Hazard(HazardKind::Bomb),
            Vec2::new(100.0, 750.0),
            Motion::Drift {
                vel: Vec2::new(0.0, 5.0),
            },
        );
        assert!(!e.is_past(700.0));
        e.advance(3.0, 0.0);
        assert!(e.is_past(700.0));
    }

    #[test]
    fn test_scrolling_entity_leaves_left_edge() {
        let e = Entity::new(
            1,
            EntityKind::Obstacle(ObstacleKind::CactusSmall),
            Vec2::new(-31.0, 140.0),
            Motion::Scroll,
        );
        assert!(e.is_past(200.0));
    }

    #[test]
    fn test_bird_flaps() {
        let mut e = Entity::new(
            1,
            EntityKind::Obstacle(ObstacleKind::Bird(BirdAltitude::Low)),
            Vec2::new(400.0, 145.0),
            Motion::Scroll,
        );
        for _ in 0..8 {
            e.advance(1.0, 6.0);
        }
        assert_eq!(e.anim_frame, 1);
    }

    #[test]
    fn test_conversion_values() {
        assert_eq!(EntityKind::Currency(Currency::Clover).conversion_value(10), 50);
        assert_eq!(EntityKind::Heart.conversion_value(10), 10);
        assert_eq!(
            EntityKind::Hazard(HazardKind::Bomb).conversion_value(10),
            HAZARD_SALVAGE
        );
        assert_eq!(
            EntityKind::PowerUp(PowerUpKind::Fortune).conversion_value(10),
            0
        );
    }

    #[test]
    fn test_particle_counts_down_to_zero() {
        let mut p = Particle::text(Vec2::new(10.0, 10.0), "+¥5", 0xFFD700);
        for _ in 0..59 {
            p.update(1.0);
        }
        assert!(!p.is_dead());
        p.update(1.0);
        assert!(p.is_dead());
        assert!(p.pos.y < 10.0);
    }
}
