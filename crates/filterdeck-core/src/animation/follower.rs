#![forbid(unsafe_code)]

//! Lerp follower with lean.
//!
//! Each step moves the current position a fixed fraction of the remaining
//! distance toward the target:
//!
//!   current += (target - current) × lerp_factor
//!
//! then derives a tilt from the remaining horizontal gap:
//!
//!   angle = clamp(-(target.x - current.x) × lean_scale, -max, +max)
//!
//! # Invariants
//!
//! 1. With `lerp_factor` in `(0, 1]` the follower never overshoots: the
//!    remaining distance shrinks monotonically by `(1 - lerp_factor)` per step.
//! 2. `|lean_degrees()| <= max_lean_degrees` after every step.
//! 3. Once the remaining distance drops below `settle_epsilon` the follower
//!    snaps onto the target and the lean is exactly zero.
//!
//! # Failure Modes
//!
//! - `lerp_factor` outside `(0, 1]`: clamped into range on construction.
//! - Non-finite target: ignored (the previous target is kept).

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Tuning for [`Follower`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Fraction of the remaining distance covered per tick (default: 0.3).
    pub lerp_factor: f32,
    /// Degrees of lean per pixel of horizontal lag (default: 0.15).
    pub lean_scale: f32,
    /// Maximum absolute lean in degrees (default: 12.0).
    pub max_lean_degrees: f32,
    /// Distance below which the follower snaps onto its target (default: 0.05).
    pub settle_epsilon: f32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            lerp_factor: 0.3,
            lean_scale: 0.15,
            max_lean_degrees: 12.0,
            settle_epsilon: 0.05,
        }
    }
}

impl FollowerConfig {
    #[must_use]
    pub fn with_lerp_factor(mut self, factor: f32) -> Self {
        self.lerp_factor = factor;
        self
    }

    #[must_use]
    pub fn with_lean(mut self, scale: f32, max_degrees: f32) -> Self {
        self.lean_scale = scale;
        self.max_lean_degrees = max_degrees;
        self
    }

    fn sanitized(mut self) -> Self {
        if !self.lerp_factor.is_finite() {
            self.lerp_factor = Self::default().lerp_factor;
        }
        self.lerp_factor = self.lerp_factor.clamp(0.01, 1.0);
        self.lean_scale = if self.lean_scale.is_finite() {
            self.lean_scale
        } else {
            0.0
        };
        self.max_lean_degrees = if self.max_lean_degrees.is_finite() {
            self.max_lean_degrees.abs()
        } else {
            0.0
        };
        self.settle_epsilon = if self.settle_epsilon.is_finite() {
            self.settle_epsilon.abs()
        } else {
            0.0
        };
        self
    }
}

/// Smooths a position toward a moving target, one fixed step at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Follower {
    config: FollowerConfig,
    current: Point,
    target: Point,
    lean_degrees: f32,
}

impl Follower {
    /// Create a follower resting at `position`.
    #[must_use]
    pub fn new(position: Point, config: FollowerConfig) -> Self {
        Self {
            config: config.sanitized(),
            current: position,
            target: position,
            lean_degrees: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Point {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> Point {
        self.target
    }

    /// Current tilt in degrees. Negative while trailing a rightward target.
    #[inline]
    #[must_use]
    pub fn lean_degrees(&self) -> f32 {
        self.lean_degrees
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    /// Record a new target. Does not move the follower; only [`step`](Self::step) does.
    pub fn set_target(&mut self, target: Point) {
        if target.is_finite() {
            self.target = target;
        }
    }

    /// Teleport both position and target, clearing the lean.
    pub fn jump_to(&mut self, position: Point) {
        if position.is_finite() {
            self.current = position;
            self.target = position;
            self.lean_degrees = 0.0;
        }
    }

    /// Override position and lean directly (used by scripted motion such as
    /// the return flight). The target follows the position.
    pub fn place(&mut self, position: Point, lean_degrees: f32) {
        if position.is_finite() {
            self.current = position;
            self.target = position;
        }
        self.lean_degrees = self.clamp_lean(lean_degrees);
    }

    /// Whether the follower sits on its target.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.current == self.target && self.lean_degrees == 0.0
    }

    /// Advance one fixed tick.
    pub fn step(&mut self) {
        let remaining = self.target - self.current;
        if remaining.length() <= self.config.settle_epsilon {
            self.current = self.target;
            self.lean_degrees = 0.0;
            return;
        }

        self.current += remaining * self.config.lerp_factor;
        let lag_x = self.target.x - self.current.x;
        self.lean_degrees = self.clamp_lean(-lag_x * self.config.lean_scale);
    }

    fn clamp_lean(&self, degrees: f32) -> f32 {
        if !degrees.is_finite() {
            return 0.0;
        }
        let max = self.config.max_lean_degrees;
        degrees.clamp(-max, max)
    }
}
