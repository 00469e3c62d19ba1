//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame-scaled updates only (see `timestep`)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod entity;
pub mod ledger;
pub mod player;
pub mod rules;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod timestep;

pub use collision::{Contact, ContactReport, Outcome, resolve_contacts};
pub use difficulty::{Difficulty, LevelDef, SpeedCurve};
pub use entity::{
    BirdAltitude, Currency, Decoration, DecorationKind, Entity, EntityKind, Fate, HazardKind,
    Motion, ObstacleKind, Particle, ParticleStyle, PowerUpKind,
};
pub use ledger::{ComboStep, ComboTable, Ledger};
pub use player::{Player, Stance, StatusEffects, StatusKind};
pub use rules::{GameKind, ModeRules, Ruleset};
pub use spawner::{GapRange, Spawner, WeightTable};
pub use state::{GameEvent, Session, SessionPhase, Snapshot};
pub use tick::{TickInput, tick};
pub use timestep::{FrameClock, frame_scale};
