#![forbid(unsafe_code)]

//! Eased point-to-point motion over a fixed duration.
//!
//! # Invariants
//!
//! 1. `position()` equals `from` before the first tick and exactly `to` once
//!    complete.
//! 2. `is_complete()` becomes true after the accumulated `dt` reaches the
//!    duration and never reverts except through `reset()`.
//! 3. A zero duration is clamped to 1ns; such a tween completes on its first
//!    non-zero tick.

use std::time::Duration;

use super::{Animation, EasingFn, ease_out_cubic};
use crate::geometry::Point;

/// Moves a point from `from` to `to` along an easing curve.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: Point,
    to: Point,
    duration: Duration,
    elapsed: Duration,
    easing: EasingFn,
}

impl Tween {
    /// Create a tween using the default cubic ease-out.
    #[must_use]
    pub fn new(from: Point, to: Point, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            elapsed: Duration::ZERO,
            easing: ease_out_cubic,
        }
    }

    /// Set the easing curve (builder pattern).
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    #[inline]
    #[must_use]
    pub fn start_point(&self) -> Point {
        self.from
    }

    #[inline]
    #[must_use]
    pub fn end_point(&self) -> Point {
        self.to
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Linear time fraction in `[0, 1]`.
    #[must_use]
    pub fn time_fraction(&self) -> f32 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0) as f32
    }

    /// Eased position for the current elapsed time.
    #[must_use]
    pub fn position(&self) -> Point {
        if self.is_complete() {
            return self.to;
        }
        self.from.lerp(self.to, self.value())
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(self.time_fraction())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}
