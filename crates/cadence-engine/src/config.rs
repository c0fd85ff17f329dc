//! Scheduler configuration and validation.

use std::error::Error;
use std::fmt;

/// Default clock step: 0.1 ms.
pub const DEFAULT_DT: f64 = 1e-4;

/// Default tick-reconciliation tolerance, as a fraction of one tick.
pub const DEFAULT_TICK_TOLERANCE: f64 = 1e-6;

// ── SchedulerConfig ────────────────────────────────────────────────

/// Configuration shared by a [`Registry`](crate::Registry) and the
/// networks it builds.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Step of the default clock, in seconds. Default: 1e-4.
    pub default_dt: f64,
    /// How far (as a fraction of a tick) a time may miss a tick boundary
    /// and still count as on it. Default: 1e-6.
    pub tick_tolerance: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_dt: DEFAULT_DT,
            tick_tolerance: DEFAULT_TICK_TOLERANCE,
        }
    }
}

impl SchedulerConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_dt.is_finite() || self.default_dt <= 0.0 {
            return Err(ConfigError::InvalidDt {
                value: self.default_dt,
            });
        }
        // A tolerance of half a tick or more would merge adjacent ticks.
        if !self.tick_tolerance.is_finite() || !(0.0..0.5).contains(&self.tick_tolerance) {
            return Err(ConfigError::InvalidTolerance {
                value: self.tick_tolerance,
            });
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SchedulerConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `default_dt` is NaN, infinite, zero, or negative.
    InvalidDt {
        /// The invalid value.
        value: f64,
    },
    /// `tick_tolerance` is outside `[0, 0.5)`.
    InvalidTolerance {
        /// The invalid value.
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDt { value } => {
                write!(f, "default_dt must be finite and positive, got {value}")
            }
            Self::InvalidTolerance { value } => {
                write!(f, "tick_tolerance must be in [0, 0.5), got {value}")
            }
        }
    }
}

impl Error for ConfigError {}
