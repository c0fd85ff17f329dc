//! Error types for clocks and network runs.

use std::error::Error;
use std::fmt;

use cadence_core::UpdateError;

/// Errors from constructing or positioning a [`Clock`](crate::Clock).
#[derive(Clone, Debug, PartialEq)]
pub enum ClockError {
    /// `dt` is NaN, infinite, zero, or negative.
    InvalidDt {
        /// The rejected step.
        dt: f64,
    },
    /// A requested time is NaN, infinite, or negative.
    InvalidTime {
        /// The rejected time.
        t: f64,
    },
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDt { dt } => write!(f, "clock dt must be finite and positive, got {dt}"),
            Self::InvalidTime { t } => {
                write!(f, "clock time must be finite and non-negative, got {t}")
            }
        }
    }
}

impl Error for ClockError {}

/// Errors from [`Network::run`](crate::Network::run).
#[derive(Clone, Debug, PartialEq)]
pub enum RunError {
    /// The requested duration is NaN, infinite, or negative.
    InvalidDuration {
        /// The rejected duration.
        duration: f64,
    },
    /// A unit's update returned an error; the run was aborted.
    UnitFailed {
        /// Name of the failing unit.
        name: String,
        /// Simulated time of the failing sub-step.
        t: f64,
        /// The unit's error.
        reason: UpdateError,
    },
    /// A unit was updated while its body was already borrowed, typically
    /// by a nested run started from inside its own update.
    ReentrantUpdate {
        /// Name of the unit.
        name: String,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDuration { duration } => {
                write!(f, "run duration must be finite and non-negative, got {duration}")
            }
            Self::UnitFailed { name, t, reason } => {
                write!(f, "unit '{name}' failed at t={t}: {reason}")
            }
            Self::ReentrantUpdate { name } => {
                write!(f, "unit '{name}' is already being updated")
            }
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnitFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
