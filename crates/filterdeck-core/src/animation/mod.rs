#![forbid(unsafe_code)]

//! Frame-stepped animation primitives.
//!
//! Every animation here is a cooperative step function: the owner calls
//! [`Animation::tick`] once per frame, the animation does a bounded amount of
//! work and returns. Nothing blocks and nothing spawns.
//!
//! - [`Follower`]: lerp smoothing plus lean, used for the drag ghost.
//! - [`Tween`]: eased point-to-point motion over a fixed duration.
//! - [`FrameTicker`]: converts wall-clock deltas into whole fixed-rate ticks.
//! - [`FrameClock`]: turns `Instant` samples into deltas.

pub mod follower;
pub mod ticker;
pub mod tween;

use std::time::Duration;

pub use follower::{Follower, FollowerConfig};
pub use ticker::{FrameClock, FrameTicker};
pub use tween::Tween;

/// An easing curve mapping normalized time `[0, 1]` to progress `[0, 1]`.
pub type EasingFn = fn(f32) -> f32;

/// A time-driven animation.
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Normalized progress in `[0.0, 1.0]`.
    fn value(&self) -> f32;

    /// Return to the initial state.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

#[inline]
#[must_use]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

#[inline]
#[must_use]
pub fn ease_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out: fast departure, gentle settle.
#[inline]
#[must_use]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

#[inline]
#[must_use]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-out. Default curve for the return flight.
#[inline]
#[must_use]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}
