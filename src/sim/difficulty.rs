//! Difficulty progression
//!
//! Two policies:
//! - `Continuous`: world speed creeps up every tick to a cap, and spawn gaps
//!   shrink with speed (endless runner)
//! - `Staged`: a table of level descriptors, swapped atomically only when a
//!   level is entered (level game)

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Continuous speed progression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedCurve {
    pub base: f32,
    pub max: f32,
    /// Added per nominal frame
    pub increment: f32,
    /// Gap shrink per unit of speed above base
    pub gap_falloff: f32,
    /// Smallest gap factor
    pub gap_floor: f32,
}

impl Default for SpeedCurve {
    fn default() -> Self {
        Self {
            base: 6.0,
            max: 13.0,
            increment: 0.001,
            gap_falloff: 0.05,
            gap_floor: 0.7,
        }
    }
}

/// Runtime state of the continuous policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousDifficulty {
    pub curve: SpeedCurve,
    speed: f32,
}

impl ContinuousDifficulty {
    pub fn new(curve: SpeedCurve) -> Self {
        Self {
            curve,
            speed: curve.base,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Raise speed by one scaled increment, never past the cap
    pub fn advance(&mut self, scale: f32) {
        if self.speed < self.curve.max {
            self.speed = (self.speed + self.curve.increment * scale).min(self.curve.max);
        }
    }

    /// Multiplier applied to spawn gaps: 1.0 at base speed, shrinking toward
    /// `gap_floor` as speed rises
    pub fn gap_factor(&self) -> f32 {
        (1.0 - (self.speed - self.curve.base) * self.curve.gap_falloff).max(self.curve.gap_floor)
    }

    pub fn reset(&mut self) {
        self.speed = self.curve.base;
    }
}

/// Parameters of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    pub id: u32,
    /// What the player is saving up for
    pub name: String,
    /// Wealth needed to clear the level
    pub target: u64,
    /// Ticks between spawns
    pub spawn_interval: f32,
    pub fall_speed: f32,
    /// Chance that a spawn is a hazard
    pub hazard_chance: f32,
    /// Second-spawn rolls enabled
    pub multi: bool,
    #[serde(default)]
    pub power_ups: bool,
    /// Bottles join the hazard mix
    #[serde(default)]
    pub bottles: bool,
}

impl LevelDef {
    /// Canonical seven-level table
    pub fn canonical_table() -> Vec<LevelDef> {
        let rows: [(&str, u64, f32, f32, f32, bool); 7] = [
            ("Tsingtao Beer", 15, 65.0, 3.0, 0.12, false),
            ("Jing Jiu", 35, 58.0, 3.5, 0.15, false),
            ("Laobaigan", 60, 52.0, 4.0, 0.18, true),
            ("Niulanshan Erguotou", 100, 46.0, 4.5, 0.20, true),
            ("Langjiu", 200, 42.0, 5.0, 0.22, true),
            ("Wuliangye", 400, 40.0, 5.5, 0.24, true),
            ("Feitian Moutai", 1000, 36.0, 6.0, 0.27, true),
        ];
        rows.iter()
            .enumerate()
            .map(
                |(i, &(name, target, spawn_interval, fall_speed, hazard_chance, multi))| LevelDef {
                    id: i as u32 + 1,
                    name: name.to_string(),
                    target,
                    spawn_interval,
                    fall_speed,
                    hazard_chance,
                    multi,
                    power_ups: i >= 2,
                    bottles: i >= 4,
                },
            )
            .collect()
    }
}

/// Runtime state of the staged policy; never holds an empty table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StagedState")]
pub struct StagedDifficulty {
    levels: Vec<LevelDef>,
    index: usize,
}

/// Unchecked serialized form, validated on the way in
#[derive(Deserialize)]
struct StagedState {
    levels: Vec<LevelDef>,
    index: usize,
}

impl TryFrom<StagedState> for StagedDifficulty {
    type Error = ConfigError;

    fn try_from(state: StagedState) -> Result<Self, Self::Error> {
        let mut staged = Self::new(state.levels)?;
        staged.select(state.index);
        Ok(staged)
    }
}

impl StagedDifficulty {
    pub fn new(levels: Vec<LevelDef>) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        Ok(Self { levels, index: 0 })
    }

    /// The built-in seven-level table
    pub fn canonical() -> Self {
        Self {
            levels: LevelDef::canonical_table(),
            index: 0,
        }
    }

    pub fn current(&self) -> &LevelDef {
        &self.levels[self.index]
    }

    /// 0-based level index
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_final(&self) -> bool {
        self.index + 1 >= self.levels.len()
    }

    /// Move to the next level; false (and no change) after the last one
    pub fn advance(&mut self) -> bool {
        if self.is_final() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Jump to a level (clamped to the table)
    pub fn select(&mut self, index: usize) {
        self.index = index.min(self.levels.len() - 1);
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

/// Active difficulty policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Difficulty {
    Continuous(ContinuousDifficulty),
    Staged(StagedDifficulty),
}

impl Difficulty {
    /// Current world speed (scroll speed or base fall speed)
    pub fn speed(&self) -> f32 {
        match self {
            Difficulty::Continuous(c) => c.speed(),
            Difficulty::Staged(s) => s.current().fall_speed,
        }
    }

    pub fn gap_factor(&self) -> f32 {
        match self {
            Difficulty::Continuous(c) => c.gap_factor(),
            Difficulty::Staged(_) => 1.0,
        }
    }

    pub fn level(&self) -> Option<&LevelDef> {
        match self {
            Difficulty::Continuous(_) => None,
            Difficulty::Staged(s) => Some(s.current()),
        }
    }

    /// Per-tick progression; only the continuous policy moves mid-run
    pub fn advance(&mut self, scale: f32) {
        if let Difficulty::Continuous(c) = self {
            c.advance(scale);
        }
    }

    /// Back to the first level / base speed
    pub fn reset(&mut self) {
        match self {
            Difficulty::Continuous(c) => c.reset(),
            Difficulty::Staged(s) => s.reset(),
        }
    }
}
