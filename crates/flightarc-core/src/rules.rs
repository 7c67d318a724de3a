//! Tunables for the simulation clock, fade-out and path density.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationRules {
    /// Length of the simulation window after the first departure (minutes)
    pub horizon_minutes: i64,
    /// Simulated time covered by one tick (seconds)
    pub tick_seconds: i64,
    /// Opacity a flight starts decaying from
    pub base_opacity: f64,
    /// Opacity removed on every decaying tick
    pub opacity_step: f64,
    /// Geodesic spacing between path waypoints (meters)
    pub point_spacing_m: f64,
}

impl Default for SimulationRules {
    fn default() -> Self {
        Self {
            horizon_minutes: 2 * 24 * 60,
            tick_seconds: 60,
            base_opacity: 0.3,
            opacity_step: 0.05,
            point_spacing_m: 100_000.0,
        }
    }
}

impl SimulationRules {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.tick_seconds <= 0 {
            return Err(SimulationError::InvalidRules(format!(
                "tick_seconds must be positive, got {}",
                self.tick_seconds
            )));
        }
        if self.horizon_minutes <= 0 {
            return Err(SimulationError::InvalidRules(format!(
                "horizon_minutes must be positive, got {}",
                self.horizon_minutes
            )));
        }
        if Duration::try_seconds(self.tick_seconds).is_none() {
            return Err(SimulationError::InvalidRules(format!(
                "tick_seconds is out of range, got {}",
                self.tick_seconds
            )));
        }
        if Duration::try_minutes(self.horizon_minutes).is_none() {
            return Err(SimulationError::InvalidRules(format!(
                "horizon_minutes is out of range, got {}",
                self.horizon_minutes
            )));
        }
        if !(self.base_opacity > 0.0 && self.base_opacity <= 1.0) {
            return Err(SimulationError::InvalidRules(format!(
                "base_opacity must be in (0, 1], got {}",
                self.base_opacity
            )));
        }
        if !(self.opacity_step.is_finite() && self.opacity_step > 0.0) {
            return Err(SimulationError::InvalidRules(format!(
                "opacity_step must be positive, got {}",
                self.opacity_step
            )));
        }
        if !(self.point_spacing_m.is_finite() && self.point_spacing_m > 0.0) {
            return Err(SimulationError::InvalidRules(format!(
                "point_spacing_m must be positive, got {}",
                self.point_spacing_m
            )));
        }
        Ok(())
    }

    /// Saturates at `Duration::MAX`; `validate` rejects values that would.
    pub fn tick_duration(&self) -> Duration {
        Duration::try_seconds(self.tick_seconds).unwrap_or(Duration::MAX)
    }

    pub fn horizon(&self) -> Duration {
        Duration::try_minutes(self.horizon_minutes).unwrap_or(Duration::MAX)
    }

    /// Number of ticks a flight spends decaying before its opacity reaches zero.
    pub fn decay_ticks(&self) -> u32 {
        // Epsilon absorbs 0.3 / 0.05 = 5.999...
        let steps = (self.base_opacity / self.opacity_step - 1e-9).ceil();
        steps.max(1.0) as u32
    }

    /// Opacity after `ticks` decay steps, clamped to `[0, base_opacity]`.
    pub fn opacity_after(&self, ticks: u32) -> f64 {
        if ticks >= self.decay_ticks() {
            return 0.0;
        }
        (self.base_opacity - self.opacity_step * f64::from(ticks)).clamp(0.0, self.base_opacity)
    }

    /// Number of frames a full run produces: `horizon / tick`, rounded up.
    pub fn frame_count(&self) -> u64 {
        if self.tick_seconds <= 0 || self.horizon_minutes <= 0 {
            return 0;
        }
        let horizon = self.horizon_minutes.saturating_mul(60);
        let frames = horizon.saturating_add(self.tick_seconds - 1) / self.tick_seconds;
        frames as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_two_days_in_minute_ticks() {
        let rules = SimulationRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.frame_count(), 2880);
        assert_eq!(rules.tick_duration(), Duration::minutes(1));
    }

    #[test]
    fn default_fade_takes_six_ticks() {
        let rules = SimulationRules::default();
        assert_eq!(rules.decay_ticks(), 6);
        assert!((rules.opacity_after(0) - 0.3).abs() < 1e-12);
        assert!((rules.opacity_after(1) - 0.25).abs() < 1e-12);
        assert!(rules.opacity_after(5) > 0.0);
        assert_eq!(rules.opacity_after(6), 0.0);
        assert_eq!(rules.opacity_after(60), 0.0);
    }

    #[test]
    fn uneven_step_still_clamps_at_zero() {
        let rules = SimulationRules {
            base_opacity: 0.3,
            opacity_step: 0.07,
            ..Default::default()
        };
        assert_eq!(rules.decay_ticks(), 5);
        assert!(rules.opacity_after(4) > 0.0);
        assert_eq!(rules.opacity_after(5), 0.0);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut rules = SimulationRules::default();
        rules.tick_seconds = 0;
        assert!(rules.validate().is_err());

        let mut rules = SimulationRules::default();
        rules.base_opacity = 1.5;
        assert!(rules.validate().is_err());

        let mut rules = SimulationRules::default();
        rules.point_spacing_m = f64::NAN;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn validate_rejects_durations_out_of_range() {
        let rules = SimulationRules {
            horizon_minutes: 1_000_000_000_000_000,
            ..Default::default()
        };
        assert!(matches!(rules.validate(), Err(SimulationError::InvalidRules(_))));
        assert_eq!(rules.horizon(), Duration::MAX);
        assert!(rules.frame_count() > 0);

        let rules = SimulationRules {
            tick_seconds: i64::MAX,
            ..Default::default()
        };
        assert!(matches!(rules.validate(), Err(SimulationError::InvalidRules(_))));
        assert_eq!(rules.tick_duration(), Duration::MAX);
        assert_eq!(rules.frame_count(), 1);
    }

    #[test]
    fn frame_count_rounds_partial_tick_up() {
        let rules = SimulationRules {
            horizon_minutes: 10,
            tick_seconds: 45,
            ..Default::default()
        };
        assert_eq!(rules.frame_count(), 14);

        let rules = SimulationRules {
            tick_seconds: 0,
            ..Default::default()
        };
        assert_eq!(rules.frame_count(), 0);
    }

    #[test]
    fn rules_deserialize_with_partial_fields() {
        let rules: SimulationRules = serde_json::from_str(r#"{"tick_seconds": 30}"#).unwrap();
        assert_eq!(rules.tick_seconds, 30);
        assert_eq!(rules.horizon_minutes, 2880);
    }
}
