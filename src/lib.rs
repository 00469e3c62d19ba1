//! Arcade Sim - simulation core for two canvas arcade games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player, entities, spawning, collisions, session)
//! - `platform`: Host integration (sampled input, frame loop, logging init)
//! - `render`: Read-only draw contract consumed by the host
//! - `audio`: Fire-and-forget sound effects
//! - `persistence`: Key/value storage backends
//! - `highscores`: Single best value per game
//! - `settings`: User preferences and ruleset overrides

pub mod audio;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod render;
pub mod settings;
pub mod sim;

pub use error::{AudioError, ConfigError, StorageError};
pub use highscores::BestScore;
pub use settings::{GameChoice, Settings};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Frame timing constants
pub mod consts {
    /// Nominal frame duration the simulation is tuned for (60 Hz)
    pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;
    /// Largest wall-clock delta accepted for one frame (tab suspension guard)
    pub const MAX_FRAME_MS: f64 = 100.0;
    /// Ticks an outcome screen stays up before continue input is accepted
    pub const OUTCOME_DELAY_TICKS: f32 = 70.0;
}

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Square box centred on the origin with the given half extent
    pub const fn centered(half: f32) -> Self {
        Self::new(-half, -half, half * 2.0, half * 2.0)
    }

    /// Translate a relative box to world space
    #[inline]
    pub fn at(&self, pos: Vec2) -> Rect {
        Rect::new(pos.x + self.x, pos.y + self.y, self.w, self.h)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap test; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}
