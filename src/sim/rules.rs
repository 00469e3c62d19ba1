//! Data-driven game balance
//!
//! Every number that shapes a run lives here as plain serde data, so the
//! simulation algorithms stay the same while tables are tuned or swapped
//! from a JSON file. `Ruleset::runner()` and `Ruleset::quest()` are the
//! canonical tables.

use serde::{Deserialize, Serialize};

use super::difficulty::{LevelDef, SpeedCurve};
use super::entity::{BirdAltitude, Currency, EntityKind, ObstacleShape, PowerUpKind};
use super::ledger::ComboTable;
use super::spawner::{GapRange, WeightTable};
use crate::Rect;
use crate::consts::OUTCOME_DELAY_TICKS;
use crate::error::ConfigError;

/// Which game a ruleset drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameKind {
    /// Endless runner ("Dino")
    Runner,
    /// Level-based collection game ("Drunkard's Quest")
    Quest,
}

/// Horizontal movement policy of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizontal {
    /// Lane runner: x never changes
    Fixed,
    /// Side-scroller: free movement, wraps around the arena edges
    Wrap,
}

/// Player physics and geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRules {
    pub width: f32,
    pub height: f32,
    /// Starting x (left edge)
    pub start_x: f32,
    pub gravity: f32,
    /// Initial vertical velocity of a jump (negative = up)
    pub jump_force: f32,
    /// Extra downward velocity when ducking in the air
    pub fast_fall: f32,
    pub move_speed: f32,
    /// Per-tick horizontal velocity retention with no intent
    pub friction: f32,
    pub horizontal: Horizontal,
    pub hitbox: Rect,
    /// Ducking hitbox; `None` disables ducking
    pub duck_hitbox: Option<Rect>,
    /// Ticks per animation frame and number of frames
    pub anim_ticks: f32,
    pub anim_frames: u8,
}

/// Status effect durations and contact values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRules {
    /// Post-hit grace window (ticks)
    pub hurt_ticks: f32,
    pub bomb_stun_ticks: f32,
    pub bottle_slow_ticks: f32,
    pub invincible_ticks: f32,
    pub buff_ticks: f32,
    /// Currency multiplier while buffed
    pub buff_multiplier: f32,
    /// Currency awarded for a heart collected at full health
    pub heart_bonus: u32,
}

impl Default for ContactRules {
    fn default() -> Self {
        Self {
            hurt_ticks: 90.0,
            bomb_stun_ticks: 20.0,
            bottle_slow_ticks: 150.0,
            invincible_ticks: 300.0,
            buff_ticks: 300.0,
            buff_multiplier: 2.0,
            heart_bonus: 10,
        }
    }
}

/// Endless-runner tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerRules {
    pub speed: SpeedCurve,
    pub obstacle_gap: GapRange,
    pub coin_gap: GapRange,
    pub cloud_gap: GapRange,
    /// Obstacles spawn this far past the right edge
    pub spawn_margin: f32,
    /// Score at which birds join the obstacle mix
    pub bird_score: f64,
    pub obstacles: WeightTable<ObstacleShape>,
    pub obstacles_with_birds: WeightTable<ObstacleShape>,
    pub bird_altitudes: WeightTable<BirdAltitude>,
    /// Coin heights above the ground line
    pub coin_lifts: WeightTable<f32>,
    pub score_per_tick: f64,
    pub milestone_step: u64,
    /// Score interval between day/night toggles
    pub night_step: u64,
    pub coins_per_life: u32,
}

/// Level-based collection tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestRules {
    pub levels: Vec<LevelDef>,
    /// Beneficial items (currency tiers and hearts)
    pub items: WeightTable<EntityKind>,
    pub power_ups: WeightTable<PowerUpKind>,
    /// Chance a spawn is a power-up on levels that enable them
    pub power_up_chance: f32,
    /// Share of hazards that are bottles on levels that enable them
    pub bottle_share: f32,
    /// Chance of a second item on multi-spawn levels
    pub multi_chance: f32,
    /// Horizontal spawn margin
    pub spawn_margin: f32,
    /// Items appear this far above the top edge
    pub spawn_y: f32,
    /// Random extra fall speed `[0, fall_jitter)`
    pub fall_jitter: f32,
    /// Random sideways drift `[-drift/2, drift/2)`
    pub drift: f32,
}

/// Per-mode tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModeRules {
    Runner(RunnerRules),
    Quest(QuestRules),
}

/// Complete balance data for one game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ruleset {
    pub width: f32,
    pub height: f32,
    pub ground_y: f32,
    pub start_lives: u8,
    pub max_lives: u8,
    pub player: PlayerRules,
    pub contact: ContactRules,
    pub combo: ComboTable,
    /// Ticks an outcome screen must show before continue is accepted
    pub outcome_delay_ticks: f32,
    /// Storage key of the persisted best value
    pub best_key: String,
    pub mode: ModeRules,
}

impl Ruleset {
    /// Canonical "Dino" endless runner
    pub fn runner() -> Self {
        let ground_y = 175.0;
        Self {
            width: 800.0,
            height: 200.0,
            ground_y,
            start_lives: 1,
            max_lives: 3,
            player: PlayerRules {
                width: 50.0,
                height: 47.0,
                start_x: 50.0,
                gravity: 0.6,
                jump_force: -12.0,
                fast_fall: 0.5,
                move_speed: 0.0,
                friction: 1.0,
                horizontal: Horizontal::Fixed,
                hitbox: Rect::new(10.0, 5.0, 35.0, 40.0),
                duck_hitbox: Some(Rect::new(5.0, 20.0, 50.0, 25.0)),
                anim_ticks: 6.0,
                anim_frames: 2,
            },
            contact: ContactRules::default(),
            combo: ComboTable::canonical(),
            outcome_delay_ticks: 30.0,
            best_key: "dino_high_score".to_string(),
            mode: ModeRules::Runner(RunnerRules {
                speed: SpeedCurve::default(),
                obstacle_gap: GapRange::new(300.0, 600.0),
                coin_gap: GapRange::new(180.0, 350.0),
                cloud_gap: GapRange::new(200.0, 400.0),
                spawn_margin: 50.0,
                bird_score: 200.0,
                obstacles: WeightTable::from_pairs(&[
                    (ObstacleShape::CactusSmall, 50.0),
                    (ObstacleShape::CactusLarge, 30.0),
                    (ObstacleShape::CactusGroup, 20.0),
                ]),
                obstacles_with_birds: WeightTable::from_pairs(&[
                    (ObstacleShape::Bird, 25.0),
                    (ObstacleShape::CactusSmall, 25.0),
                    (ObstacleShape::CactusLarge, 30.0),
                    (ObstacleShape::CactusGroup, 20.0),
                ]),
                bird_altitudes: WeightTable::from_pairs(&[
                    (BirdAltitude::Low, 40.0),
                    (BirdAltitude::Medium, 30.0),
                    (BirdAltitude::High, 30.0),
                ]),
                coin_lifts: WeightTable::from_pairs(&[(22.0, 50.0), (58.0, 30.0), (92.0, 20.0)]),
                score_per_tick: 0.15,
                milestone_step: 100,
                night_step: 700,
                coins_per_life: 30,
            }),
        }
    }

    /// Canonical "Drunkard's Quest" level game
    pub fn quest() -> Self {
        let width = 390.0;
        let height = 700.0;
        let ground_y = height - 100.0;
        let player_width = 40.0;
        Self {
            width,
            height,
            ground_y,
            start_lives: 3,
            max_lives: 3,
            player: PlayerRules {
                width: player_width,
                height: 60.0,
                start_x: width / 2.0 - player_width / 2.0,
                gravity: 0.55,
                jump_force: -13.0,
                fast_fall: 0.0,
                move_speed: 5.5,
                friction: 0.72,
                horizontal: Horizontal::Wrap,
                hitbox: Rect::new(7.0, 4.0, player_width - 14.0, 56.0),
                duck_hitbox: None,
                anim_ticks: 9.0,
                anim_frames: 4,
            },
            contact: ContactRules::default(),
            combo: ComboTable::canonical(),
            outcome_delay_ticks: OUTCOME_DELAY_TICKS,
            best_key: "drunkard_best_wealth".to_string(),
            mode: ModeRules::Quest(QuestRules {
                levels: LevelDef::canonical_table(),
                items: WeightTable::from_pairs(&[
                    (EntityKind::Currency(Currency::Yuan1), 33.0),
                    (EntityKind::Currency(Currency::Yuan5), 23.0),
                    (EntityKind::Currency(Currency::Yuan10), 14.0),
                    (EntityKind::Currency(Currency::MoneyBag), 8.0),
                    (EntityKind::Currency(Currency::Clover), 4.0),
                    (EntityKind::Heart, 3.0),
                ]),
                power_ups: WeightTable::from_pairs(&[
                    (PowerUpKind::ClearScreen, 30.0),
                    (PowerUpKind::Invincibility, 40.0),
                    (PowerUpKind::Fortune, 30.0),
                ]),
                power_up_chance: 0.04,
                bottle_share: 1.0 / 3.0,
                multi_chance: 0.42,
                spawn_margin: 28.0,
                spawn_y: -30.0,
                fall_jitter: 1.5,
                drift: 1.2,
            }),
        }
    }

    pub fn for_game(kind: GameKind) -> Self {
        match kind {
            GameKind::Runner => Self::runner(),
            GameKind::Quest => Self::quest(),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self.mode {
            ModeRules::Runner(_) => GameKind::Runner,
            ModeRules::Quest(_) => GameKind::Quest,
        }
    }

    /// Parse a ruleset from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let rules: Ruleset = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reject tables the simulation cannot run with.
    ///
    /// Zero-sum weight tables are allowed: they fall back to their first row.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("width", self.width),
            ("height", self.height),
            ("ground_y", self.ground_y),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        if self.best_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "best_key",
                value: 0.0,
            });
        }
        if self.max_lives == 0 || self.start_lives == 0 || self.start_lives > self.max_lives {
            return Err(ConfigError::InvalidValue {
                field: "start_lives",
                value: self.start_lives as f32,
            });
        }

        match &self.mode {
            ModeRules::Runner(runner) => {
                check_gap("obstacle_gap", runner.obstacle_gap)?;
                check_gap("coin_gap", runner.coin_gap)?;
                check_gap("cloud_gap", runner.cloud_gap)?;
                if runner.obstacles.is_empty() || runner.obstacles_with_birds.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "obstacles",
                        value: 0.0,
                    });
                }
            }
            ModeRules::Quest(quest) => {
                if quest.levels.is_empty() {
                    return Err(ConfigError::NoLevels);
                }
                for level in &quest.levels {
                    check_gap("spawn_interval", GapRange::fixed(level.spawn_interval))?;
                }
                if quest.items.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "items",
                        value: 0.0,
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_gap(population: &'static str, gap: GapRange) -> Result<(), ConfigError> {
    if gap.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::InvalidGap {
            population,
            min: gap.min,
            max: gap.max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_rulesets_validate() {
        assert!(Ruleset::runner().validate().is_ok());
        assert!(Ruleset::quest().validate().is_ok());
        assert_eq!(Ruleset::runner().kind(), GameKind::Runner);
        assert_eq!(Ruleset::quest().kind(), GameKind::Quest);
    }

    #[test]
    fn test_json_round_trip_keeps_tables() {
        let json = serde_json::to_string(&Ruleset::quest()).unwrap_or_default();
        let parsed = Ruleset::from_json(&json);
        assert!(parsed.is_ok());
        let parsed = parsed.unwrap_or_else(|_| Ruleset::runner());
        let ModeRules::Quest(quest) = parsed.mode else {
            panic!("expected quest rules");
        };
        assert_eq!(quest.levels.len(), 7);
        assert_eq!(quest.levels[6].target, 1000);
    }

    #[test]
    fn test_empty_level_table_rejected() {
        let mut rules = Ruleset::quest();
        if let ModeRules::Quest(quest) = &mut rules.mode {
            quest.levels.clear();
        }
        assert!(matches!(rules.validate(), Err(ConfigError::NoLevels)));
    }

    #[test]
    fn test_bad_gap_rejected() {
        let mut rules = Ruleset::runner();
        if let ModeRules::Runner(runner) = &mut rules.mode {
            runner.coin_gap = GapRange::new(0.0, 10.0);
        }
        assert!(matches!(
            rules.validate(),
            Err(ConfigError::InvalidGap {
                population: "coin_gap",
                ..
            })
        ));
    }

    #[test]
    fn test_blank_best_key_rejected() {
        let mut rules = Ruleset::runner();
        rules.best_key = "  ".to_string();
        assert!(matches!(
            rules.validate(),
            Err(ConfigError::InvalidValue {
                field: "best_key",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(
            Ruleset::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
