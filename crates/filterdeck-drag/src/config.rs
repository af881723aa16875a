#![forbid(unsafe_code)]

//! Engine tuning.
//!
//! # Loading
//!
//! With the `policy-config` feature:
//!
//! ```toml
//! tick_hz = 60
//! max_catch_up_ticks = 4
//! return_duration_ms = 200
//!
//! [follower]
//! lerp_factor = 0.3
//! lean_scale = 0.15
//! max_lean_degrees = 12.0
//! ```
//!
//! Missing keys take their defaults. Loaders run [`DragConfig::validate`] and
//! fail with [`DragError::Config`](crate::DragError::Config) listing every
//! problem.

#[cfg(feature = "policy-config")]
use std::path::Path;
use std::time::Duration;

use filterdeck_core::animation::FollowerConfig;
use serde::{Deserialize, Serialize};

/// Default tick rate of the ghost timer.
pub const DEFAULT_TICK_HZ: u32 = 60;

/// Default return flight length.
pub const DEFAULT_RETURN_DURATION_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub follower: FollowerConfig,
    pub tick_hz: u32,
    /// Ticks processed per `tick` call at most; excess time is dropped.
    pub max_catch_up_ticks: u32,
    pub return_duration_ms: u64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            follower: FollowerConfig::default(),
            tick_hz: DEFAULT_TICK_HZ,
            max_catch_up_ticks: 4,
            return_duration_ms: DEFAULT_RETURN_DURATION_MS,
        }
    }
}

impl DragConfig {
    #[must_use]
    pub fn with_follower(mut self, follower: FollowerConfig) -> Self {
        self.follower = follower;
        self
    }

    #[must_use]
    pub fn with_tick_hz(mut self, hz: u32) -> Self {
        self.tick_hz = hz;
        self
    }

    #[must_use]
    pub fn with_max_catch_up_ticks(mut self, ticks: u32) -> Self {
        self.max_catch_up_ticks = ticks;
        self
    }

    #[must_use]
    pub fn with_return_duration(mut self, duration: Duration) -> Self {
        self.return_duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Fixed tick period, rounded to the nearest nanosecond. A zero rate is
    /// treated as 1 Hz.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        let hz = u64::from(self.tick_hz.max(1));
        Duration::from_nanos((1_000_000_000 + hz / 2) / hz)
    }

    #[must_use]
    pub fn return_duration(&self) -> Duration {
        Duration::from_millis(self.return_duration_ms)
    }

    /// Problems with this config; empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(1..=1000).contains(&self.tick_hz) {
            errors.push(format!("tick_hz must be in 1..=1000, got {}", self.tick_hz));
        }
        if self.max_catch_up_ticks == 0 {
            errors.push("max_catch_up_ticks must be > 0".into());
        }
        let f = &self.follower;
        if !(f.lerp_factor > 0.0 && f.lerp_factor <= 1.0) {
            errors.push(format!(
                "follower.lerp_factor must be in (0, 1], got {}",
                f.lerp_factor
            ));
        }
        if !(f.max_lean_degrees >= 0.0 && f.max_lean_degrees.is_finite()) {
            errors.push(format!(
                "follower.max_lean_degrees must be finite and >= 0, got {}",
                f.max_lean_degrees
            ));
        }
        if f.settle_epsilon.is_nan() || f.settle_epsilon < 0.0 {
            errors.push(format!(
                "follower.settle_epsilon must be >= 0, got {}",
                f.settle_epsilon
            ));
        }
        errors
    }

    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| crate::DragError::config(format!("drag config: {e}")))?;
        config.checked()
    }

    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::DragError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| crate::DragError::config(format!("drag config: {e}")))?;
        config.checked()
    }

    #[cfg(feature = "policy-config")]
    fn checked(self) -> crate::Result<Self> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(crate::DragError::config(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DragConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.return_duration(), Duration::from_millis(200));
        assert_eq!(config.tick_interval(), Duration::from_nanos(16_666_667));
        assert!((config.follower.lerp_factor - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn builders_apply() {
        let config = DragConfig::default()
            .with_tick_hz(120)
            .with_max_catch_up_ticks(2)
            .with_return_duration(Duration::from_millis(350));
        assert_eq!(config.tick_interval(), Duration::from_nanos(8_333_333));
        assert_eq!(config.max_catch_up_ticks, 2);
        assert_eq!(config.return_duration_ms, 350);
    }

    #[test]
    fn zero_rate_is_reported_but_never_divides_by_zero() {
        let config = DragConfig::default().with_tick_hz(0);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert!(config.validate().iter().any(|e| e.contains("tick_hz")));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: DragConfig = serde_json::from_str(r#"{"return_duration_ms": 120}"#).unwrap();
        assert_eq!(config.return_duration_ms, 120);
        assert_eq!(config.tick_hz, DEFAULT_TICK_HZ);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_loader_validates() {
        let config = DragConfig::from_toml_str("tick_hz = 30\n[follower]\nlerp_factor = 0.5\n").unwrap();
        assert_eq!(config.tick_hz, 30);
        assert!((config.follower.lerp_factor - 0.5).abs() < f32::EPSILON);

        let err = DragConfig::from_toml_str("max_catch_up_ticks = 0").unwrap_err();
        assert!(err.to_string().contains("max_catch_up_ticks"));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn json_loader_rejects_garbage() {
        assert!(DragConfig::from_json_str("{").is_err());
    }
}
