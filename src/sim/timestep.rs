//! Frame-rate normalisation
//!
//! Converts wall-clock frame deltas into a dimensionless `scale` that is
//! 1.0 at the nominal 60 Hz. Every per-tick velocity and timer update in the
//! simulation multiplies by this scale instead of raw milliseconds.

use crate::consts::{MAX_FRAME_MS, NOMINAL_FRAME_MS};

/// Largest scale a single frame can produce
pub const MAX_SCALE: f32 = (MAX_FRAME_MS / NOMINAL_FRAME_MS) as f32;

/// Scale for a raw frame delta, clamped to `[0, MAX_FRAME_MS]`
#[inline]
pub fn frame_scale(delta_ms: f64) -> f32 {
    if !delta_ms.is_finite() || delta_ms <= 0.0 {
        return 0.0;
    }
    (delta_ms.min(MAX_FRAME_MS) / NOMINAL_FRAME_MS) as f32
}

/// Tracks the previous frame timestamp and yields one scale per frame
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last_ms: None }
    }

    /// Feed the host's frame timestamp and get this frame's scale.
    ///
    /// The very first frame has no reference point and counts as exactly one
    /// nominal frame. Timestamps going backwards yield 0.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let scale = match self.last_ms {
            None => 1.0,
            Some(last) => frame_scale(now_ms - last),
        };
        self.last_ms = Some(now_ms);
        scale
    }

    /// Forget the previous timestamp (e.g. after the host was suspended)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}
