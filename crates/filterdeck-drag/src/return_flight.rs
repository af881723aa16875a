#![forbid(unsafe_code)]

//! Cancel animation: the ghost eases back to where the drag began.
//!
//! # Invariants
//!
//! 1. The flight lasts exactly its configured duration of ticked time; it
//!    cannot be shortened, only interrupted by a hard reset.
//! 2. Lean decays linearly with the eased progress and is zero on landing.
//! 3. The final transform is exactly `home` with zero lean.

use std::time::Duration;

use filterdeck_core::animation::{Animation, Tween};
use filterdeck_core::geometry::Point;

use crate::ghost::GhostTransform;

#[derive(Debug, Clone, Copy)]
pub struct ReturnFlight {
    tween: Tween,
    start_lean: f32,
}

impl ReturnFlight {
    #[must_use]
    pub fn new(from: GhostTransform, home: Point, duration: Duration) -> Self {
        Self {
            tween: Tween::new(from.position, home, duration),
            start_lean: from.lean_degrees,
        }
    }

    #[must_use]
    pub fn home(&self) -> Point {
        self.tween.end_point()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.tween.elapsed()
    }

    #[must_use]
    pub fn transform(&self) -> GhostTransform {
        if self.tween.is_complete() {
            return GhostTransform {
                position: self.home(),
                lean_degrees: 0.0,
            };
        }
        GhostTransform {
            position: self.tween.position(),
            lean_degrees: self.start_lean * (1.0 - self.tween.value()),
        }
    }
}

impl Animation for ReturnFlight {
    fn tick(&mut self, dt: Duration) {
        self.tween.tick(dt);
    }

    fn is_complete(&self) -> bool {
        self.tween.is_complete()
    }

    fn value(&self) -> f32 {
        self.tween.value()
    }

    fn reset(&mut self) {
        self.tween.reset();
    }
}
