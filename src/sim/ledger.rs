//! Score / economy ledger
//!
//! Tracks run score, currency, lives, the combo streak, milestones and the
//! best value seen. The combo multiplier is never stored: it is always
//! recomputed from the streak through the [`ComboTable`].

use serde::{Deserialize, Serialize};

/// One breakpoint of the combo table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboStep {
    /// Streak at which this multiplier starts
    pub streak: u32,
    pub multiplier: f32,
}

/// Step function from streak length to score multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComboTable {
    steps: Vec<ComboStep>,
}

impl ComboTable {
    pub fn new(mut steps: Vec<ComboStep>) -> Self {
        steps.sort_by_key(|s| s.streak);
        Self { steps }
    }

    /// Canonical table: 3+ → ×1.5, 5+ → ×2, 10+ → ×3
    pub fn canonical() -> Self {
        Self::new(vec![
            ComboStep {
                streak: 3,
                multiplier: 1.5,
            },
            ComboStep {
                streak: 5,
                multiplier: 2.0,
            },
            ComboStep {
                streak: 10,
                multiplier: 3.0,
            },
        ])
    }

    /// Multiplier for a streak; 1.0 below the first breakpoint
    pub fn multiplier(&self, streak: u32) -> f32 {
        self.steps
            .iter()
            .rev()
            .find(|s| streak >= s.streak && s.streak > 0)
            .map(|s| s.multiplier)
            .unwrap_or(1.0)
    }
}

/// Ticks the score flashes after a milestone
pub const MILESTONE_FLASH_TICKS: f32 = 16.0;
/// Ticks per on/off phase of the flash
const FLASH_INTERVAL_TICKS: f32 = 4.0;

/// Running totals of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    combo_table: ComboTable,
    /// Distance score (runner); fractional, shown floored
    pub score: f64,
    /// Currency earned this level (quest) or coins this run (runner)
    pub wealth: u64,
    /// Wealth banked from cleared levels this campaign
    pub banked: u64,
    pub lives: u8,
    pub max_lives: u8,
    /// Consecutive beneficial contacts since the last harmful one
    pub combo: u32,
    pub last_milestone: u64,
    /// Remaining milestone flash ticks (0 when not flashing)
    pub flash_ticks: f32,
    /// Coins toward the next extra life
    pub coins_toward_life: u32,
    /// Best value ever recorded; only increases
    best: u64,
}

impl Ledger {
    pub fn new(combo_table: ComboTable, lives: u8, max_lives: u8) -> Self {
        Self {
            combo_table,
            score: 0.0,
            wealth: 0,
            banked: 0,
            lives,
            max_lives,
            combo: 0,
            last_milestone: 0,
            flash_ticks: 0.0,
            coins_toward_life: 0,
            best: 0,
        }
    }

    /// Current multiplier, derived from the streak
    pub fn multiplier(&self) -> f32 {
        self.combo_table.multiplier(self.combo)
    }

    /// Collect a currency item: extend the streak, then pay `value` scaled by
    /// the streak multiplier and any external `bonus`. Returns the amount paid.
    pub fn collect(&mut self, value: u32, bonus: f32) -> u64 {
        self.combo = self.combo.saturating_add(1);
        let bonus = if bonus.is_finite() && bonus > 0.0 { bonus } else { 1.0 };
        let earned = (value as f32 * self.multiplier() * bonus).round() as u64;
        self.wealth = self.wealth.saturating_add(earned);
        earned
    }

    /// Flat credit that bypasses the multiplier
    pub fn credit(&mut self, amount: u64) {
        self.wealth = self.wealth.saturating_add(amount);
    }

    /// Count a beneficial contact that pays nothing through `collect`
    pub fn extend_streak(&mut self) {
        self.combo = self.combo.saturating_add(1);
    }

    /// Restore one life; false (no change) at max
    pub fn heal(&mut self) -> bool {
        if self.lives < self.max_lives {
            self.lives += 1;
            true
        } else {
            false
        }
    }

    /// Harmful contact: break the streak and lose a life. Returns lives left.
    pub fn take_hit(&mut self) -> u8 {
        self.combo = 0;
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub fn restore_lives(&mut self) {
        self.lives = self.max_lives;
    }

    /// Count a runner coin; true when it completes an extra life
    pub fn count_coin(&mut self, coins_per_life: u32) -> bool {
        if coins_per_life == 0 {
            return false;
        }
        self.coins_toward_life += 1;
        if self.coins_toward_life >= coins_per_life {
            self.coins_toward_life = 0;
            return self.heal();
        }
        false
    }

    /// Add distance score; returns a newly crossed milestone
    pub fn add_distance(&mut self, amount: f64, step: u64) -> Option<u64> {
        if amount.is_finite() && amount > 0.0 {
            self.score += amount;
        }
        if step == 0 {
            return None;
        }
        let milestone = (self.score as u64 / step) * step;
        if milestone > self.last_milestone && milestone > 0 {
            self.last_milestone = milestone;
            self.flash_ticks = MILESTONE_FLASH_TICKS;
            return Some(milestone);
        }
        None
    }

    pub fn tick_flash(&mut self, scale: f32) {
        self.flash_ticks = (self.flash_ticks - scale).max(0.0);
    }

    /// Whether the score is drawn this frame (blinks while flashing)
    pub fn score_visible(&self) -> bool {
        if self.flash_ticks <= 0.0 {
            return true;
        }
        let elapsed = MILESTONE_FLASH_TICKS - self.flash_ticks;
        ((elapsed / FLASH_INTERVAL_TICKS).floor() as u32).is_multiple_of(2)
    }

    /// Floored score for display and persistence
    pub fn display_score(&self) -> u64 {
        self.score.max(0.0) as u64
    }

    /// Campaign wealth: banked levels plus the current one
    pub fn campaign_wealth(&self) -> u64 {
        self.banked.saturating_add(self.wealth)
    }

    /// Move this level's wealth into the campaign bank
    pub fn bank_level(&mut self) {
        self.banked = self.banked.saturating_add(self.wealth);
        self.wealth = 0;
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Offer a final value; true if it raised the best
    pub fn record_best(&mut self, value: u64) -> bool {
        if value > self.best {
            self.best = value;
            true
        } else {
            false
        }
    }

    /// Per-level counters back to their initial values
    pub fn reset_level(&mut self) {
        self.wealth = 0;
        self.combo = 0;
    }

    /// Everything except the best value back to a fresh run
    pub fn reset_run(&mut self, lives: u8) {
        self.score = 0.0;
        self.wealth = 0;
        self.banked = 0;
        self.lives = lives.min(self.max_lives);
        self.combo = 0;
        self.last_milestone = 0;
        self.flash_ticks = 0.0;
        self.coins_toward_life = 0;
    }
}
