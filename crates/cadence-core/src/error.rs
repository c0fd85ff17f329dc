//! Error type returned by a unit's update action.
//!
//! The scheduler wraps it in its own run error together with the failing
//! unit's name and the simulated time of the failure.

use std::error::Error;
use std::fmt;

/// Errors from an individual unit update.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateError {
    /// The update action failed.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A non-finite value was produced for a variable.
    NonFinite {
        /// The variable holding the value.
        variable: String,
        /// Index of the first offending element, if known.
        index: Option<usize>,
    },
    /// A variable the update needs is missing from its state.
    MissingVariable {
        /// The missing variable.
        variable: String,
    },
}

impl UpdateError {
    /// Shorthand for [`UpdateError::ExecutionFailed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::NonFinite { variable, index } => {
                write!(f, "non-finite value in '{variable}'")?;
                if let Some(idx) = index {
                    write!(f, " at element {idx}")?;
                }
                Ok(())
            }
            Self::MissingVariable { variable } => {
                write!(f, "variable '{variable}' is not available")
            }
        }
    }
}

impl Error for UpdateError {}
