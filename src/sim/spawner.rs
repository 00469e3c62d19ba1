//! Population spawning: weighted kind selection and gap countdowns
//!
//! A [`Spawner`] counts down a time or distance gap; when it runs out the
//! caller instantiates one entity (or two on a multi-spawn roll) and the
//! countdown is re-seeded from the configured range, scaled by difficulty.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One `(kind, weight)` row of a weighted table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weighted<K> {
    pub kind: K,
    pub weight: f32,
}

/// Fixed table of kinds with relative weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable<K> {
    entries: Vec<Weighted<K>>,
}

impl<K: Copy> WeightTable<K> {
    pub fn new(entries: Vec<Weighted<K>>) -> Self {
        Self { entries }
    }

    /// Build from `(kind, weight)` pairs
    pub fn from_pairs(pairs: &[(K, f32)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(kind, weight)| Weighted { kind, weight })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the positive weights
    pub fn total(&self) -> f32 {
        self.entries
            .iter()
            .filter(|e| e.weight.is_finite() && e.weight > 0.0)
            .map(|e| e.weight)
            .sum()
    }

    /// Select a kind for a uniform `roll` in `[0, 1)`.
    ///
    /// Zero-sum tables and rounding at the top end fall back to the first
    /// entry; only an empty table yields `None`.
    pub fn pick(&self, roll: f32) -> Option<K> {
        let first = self.entries.first()?.kind;
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return Some(first);
        }

        let mut remaining = roll.clamp(0.0, 1.0) * total;
        for entry in &self.entries {
            if !entry.weight.is_finite() || entry.weight <= 0.0 {
                continue;
            }
            remaining -= entry.weight;
            if remaining < 0.0 {
                return Some(entry.kind);
            }
        }
        Some(first)
    }

    /// Draw a kind with the session RNG
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<K> {
        self.pick(rng.random::<f32>())
    }
}

/// `[min, max)` gap in ticks or pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapRange {
    pub min: f32,
    pub max: f32,
}

impl GapRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Constant gap
    pub const fn fixed(gap: f32) -> Self {
        Self::new(gap, gap)
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.max >= self.min
    }
}

/// How a gap is taken from its range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GapDraw {
    /// Uniform random in `[min, max)`
    #[default]
    Uniform,
    /// Always the centre of the range
    Midpoint,
}

/// Smallest gap a spawner will ever schedule
pub const MIN_GAP: f32 = 1.0;

/// Countdown-driven spawner for one entity population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    range: GapRange,
    draw: GapDraw,
    /// Lower clamp applied after difficulty scaling
    floor: f32,
    /// Chance of a second spawn on the same expiry
    multi_chance: f32,
    countdown: f32,
}

impl Spawner {
    pub fn new(range: GapRange, draw: GapDraw) -> Self {
        Self {
            range,
            draw,
            floor: MIN_GAP,
            multi_chance: 0.0,
            countdown: range.max.max(MIN_GAP),
        }
    }

    pub fn with_floor(mut self, floor: f32) -> Self {
        self.floor = floor.max(MIN_GAP);
        self
    }

    pub fn with_multi_chance(mut self, chance: f32) -> Self {
        self.multi_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Remaining time/distance before the next spawn
    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    /// Gap for the current difficulty. `factor` < 1 shortens gaps.
    pub fn sample_gap<R: Rng + ?Sized>(&self, factor: f32, rng: &mut R) -> f32 {
        let base = match self.draw {
            GapDraw::Uniform if self.range.max > self.range.min => {
                self.range.min + (self.range.max - self.range.min) * rng.random::<f32>()
            }
            GapDraw::Uniform => self.range.min,
            GapDraw::Midpoint => (self.range.min + self.range.max) * 0.5,
        };
        let factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            1.0
        };
        (base * factor).max(self.floor)
    }

    /// Re-seed the countdown (canonical initial state for a new run/level)
    pub fn reset<R: Rng + ?Sized>(&mut self, factor: f32, rng: &mut R) {
        self.countdown = self.sample_gap(factor, rng);
    }

    /// Swap in a new range (level change) and re-seed
    pub fn reconfigure<R: Rng + ?Sized>(&mut self, range: GapRange, multi_chance: f32, rng: &mut R) {
        self.range = range;
        self.multi_chance = multi_chance.clamp(0.0, 1.0);
        self.reset(1.0, rng);
    }

    /// Consume `progress` (ticks or pixels) and return how many entities to
    /// spawn now: 0, 1, or 2 on a multi-spawn roll.
    ///
    /// At most one expiry is honoured per call, so a huge `progress` never
    /// produces a burst.
    pub fn advance<R: Rng + ?Sized>(&mut self, progress: f32, factor: f32, rng: &mut R) -> u32 {
        if progress.is_finite() && progress > 0.0 {
            self.countdown -= progress;
        }
        if self.countdown > 0.0 {
            return 0;
        }

        let gap = self.sample_gap(factor, rng);
        self.countdown += gap;
        if self.countdown <= 0.0 {
            self.countdown = gap;
        }

        if self.multi_chance > 0.0 && rng.random::<f32>() < self.multi_chance {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shape {
        Small,
        Large,
        Group,
    }

    fn shapes() -> WeightTable<Shape> {
        WeightTable::from_pairs(&[(Shape::Small, 50.0), (Shape::Large, 30.0), (Shape::Group, 20.0)])
    }

    #[test]
    fn test_pick_follows_cumulative_weights() {
        let table = shapes();
        assert_eq!(table.pick(0.0), Some(Shape::Small));
        assert_eq!(table.pick(0.49), Some(Shape::Small));
        assert_eq!(table.pick(0.5), Some(Shape::Large));
        assert_eq!(table.pick(0.79), Some(Shape::Large));
        assert_eq!(table.pick(0.8), Some(Shape::Group));
        assert_eq!(table.pick(0.999_999), Some(Shape::Group));
    }

    #[test]
    fn test_pick_rounding_edge_falls_back_to_first() {
        // A roll of exactly 1.0 exhausts every weight
        assert_eq!(shapes().pick(1.0), Some(Shape::Small));
    }

    #[test]
    fn test_zero_sum_table_uses_first_entry() {
        let table = WeightTable::from_pairs(&[(Shape::Large, 0.0), (Shape::Group, 0.0)]);
        assert_eq!(table.pick(0.7), Some(Shape::Large));

        let negative = WeightTable::from_pairs(&[(Shape::Group, -3.0), (Shape::Small, f32::NAN)]);
        assert_eq!(negative.pick(0.2), Some(Shape::Group));
    }

    #[test]
    fn test_empty_table_has_no_kind() {
        let table: WeightTable<Shape> = WeightTable::new(Vec::new());
        assert_eq!(table.pick(0.3), None);
    }

    #[test]
    fn test_zero_weight_rows_are_skipped() {
        let table = WeightTable::from_pairs(&[(Shape::Small, 0.0), (Shape::Large, 1.0)]);
        assert_eq!(table.pick(0.0), Some(Shape::Large));
    }

    #[test]
    fn test_spawns_exactly_every_gap() {
        // [40, 80] range at a difficulty producing a 60-tick gap
        let mut rng = Pcg32::seed_from_u64(5);
        let mut spawner = Spawner::new(GapRange::new(40.0, 80.0), GapDraw::Midpoint);
        spawner.reset(1.0, &mut rng);

        let mut spawn_ticks = Vec::new();
        for t in 1..=300 {
            let count = spawner.advance(1.0, 1.0, &mut rng);
            assert!(count <= 1);
            if count == 1 {
                spawn_ticks.push(t);
            }
        }
        assert_eq!(spawn_ticks, vec![60, 120, 180, 240, 300]);
    }

    #[test]
    fn test_difficulty_factor_shortens_gap_down_to_floor() {
        let mut rng = Pcg32::seed_from_u64(1);
        let spawner = Spawner::new(GapRange::new(300.0, 600.0), GapDraw::Midpoint).with_floor(50.0);
        assert_eq!(spawner.sample_gap(1.0, &mut rng), 450.0);
        assert_eq!(spawner.sample_gap(0.7, &mut rng), 315.0);
        assert_eq!(spawner.sample_gap(0.01, &mut rng), 50.0);
        // Garbage factor is ignored
        assert_eq!(spawner.sample_gap(f32::NAN, &mut rng), 450.0);
    }

    #[test]
    fn test_huge_progress_spawns_once() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut spawner = Spawner::new(GapRange::fixed(10.0), GapDraw::Midpoint);
        spawner.reset(1.0, &mut rng);
        assert_eq!(spawner.advance(10_000.0, 1.0, &mut rng), 1);
        assert_eq!(spawner.countdown(), 10.0);
        assert_eq!(spawner.advance(1.0, 1.0, &mut rng), 0);
    }

    #[test]
    fn test_multi_spawn_always_and_never() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut always = Spawner::new(GapRange::fixed(5.0), GapDraw::Midpoint).with_multi_chance(1.0);
        always.reset(1.0, &mut rng);
        assert_eq!(always.advance(5.0, 1.0, &mut rng), 2);

        let mut never = Spawner::new(GapRange::fixed(5.0), GapDraw::Midpoint);
        never.reset(1.0, &mut rng);
        assert_eq!(never.advance(5.0, 1.0, &mut rng), 1);
    }

    #[test]
    fn test_uniform_gap_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(77);
        let spawner = Spawner::new(GapRange::new(180.0, 350.0), GapDraw::Uniform);
        for _ in 0..1000 {
            let gap = spawner.sample_gap(1.0, &mut rng);
            assert!((180.0..=350.0).contains(&gap));
        }
    }

    proptest! {
        #[test]
        fn prop_pick_always_returns_a_kind(
            weights in proptest::collection::vec(-5.0f32..100.0, 1..8),
            roll in 0.0f32..=1.0,
        ) {
            let pairs: Vec<(usize, f32)> = weights.iter().copied().enumerate().collect();
            let table = WeightTable::from_pairs(&pairs);
            let picked = table.pick(roll);
            prop_assert!(picked.is_some());
            let idx = picked.unwrap_or_default();
            // Never a non-positive row unless it is the fallback
            prop_assert!(weights[idx] > 0.0 || idx == 0);
        }
    }
}
