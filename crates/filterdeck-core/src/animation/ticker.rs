#![forbid(unsafe_code)]

//! Fixed-rate tick scheduling.
//!
//! [`FrameTicker`] is the "one fixed-interval timer" of the drag engine. Hosts
//! feed it whatever deltas their event loop produces; it answers how many
//! whole fixed ticks are due. Pointer events never advance it, so visual
//! update rate is decoupled from input rate.
//!
//! # Invariants
//!
//! 1. A stopped ticker reports zero ticks and accumulates nothing.
//! 2. `advance` never returns more than `max_catch_up` ticks; surplus time
//!    beyond the cap is dropped rather than carried forward.
//! 3. `start()` on a running ticker is a no-op (the phase is kept).

use std::time::Duration;

use web_time::Instant;

/// Default tick interval (~60 Hz).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_micros(16_667);

/// Default cap on ticks processed per `advance` call.
pub const DEFAULT_MAX_CATCH_UP: u32 = 4;

/// Accumulates elapsed time into whole fixed ticks.
#[derive(Debug, Clone)]
pub struct FrameTicker {
    interval: Duration,
    max_catch_up: u32,
    accumulator: Duration,
    running: bool,
}

impl Default for FrameTicker {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl FrameTicker {
    /// Create a stopped ticker. A zero interval is clamped to 1ms.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: if interval.is_zero() {
                Duration::from_millis(1)
            } else {
                interval
            },
            max_catch_up: DEFAULT_MAX_CATCH_UP,
            accumulator: Duration::ZERO,
            running: false,
        }
    }

    /// Set the per-call tick cap (builder pattern). Minimum 1.
    #[must_use]
    pub fn with_max_catch_up(mut self, max: u32) -> Self {
        self.max_catch_up = max.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.accumulator = Duration::ZERO;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = Duration::ZERO;
    }

    /// Feed `dt` and return the number of ticks now due.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        self.accumulator = self.accumulator.saturating_add(dt);

        let mut due = 0u32;
        while self.accumulator >= self.interval && due < self.max_catch_up {
            self.accumulator -= self.interval;
            due += 1;
        }
        if due == self.max_catch_up && self.accumulator >= self.interval {
            self.accumulator = Duration::ZERO;
        }
        due
    }
}

/// Converts successive `Instant` samples into deltas.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta since the previous sample; zero on the first sample or if time
    /// went backwards.
    pub fn sample(&mut self, now: Instant) -> Duration {
        let dt = self
            .last
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last = Some(now);
        dt
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
