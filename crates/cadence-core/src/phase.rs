//! The [`When`] scheduling phase.
//!
//! Within a single clock tick every runnable unit is bucketed by phase
//! before the integer `order` tie-break applies. The enumeration is small,
//! fixed, and totally ordered by declaration order.

use std::fmt;
use std::str::FromStr;

/// Coarse ordering bucket applied within a clock tick.
///
/// Ordering: `Start < Groups < Thresholds < Synapses < Resets < End`.
/// `Groups` is the default mid-phase for units that do not ask for one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum When {
    /// Runs before everything else in the tick.
    Start,
    /// Default phase: per-tick state updates.
    #[default]
    Groups,
    /// Threshold evaluation after state updates.
    Thresholds,
    /// Propagation along connections.
    Synapses,
    /// Post-threshold resets.
    Resets,
    /// Runs after everything else in the tick (monitors, recorders).
    End,
}

impl When {
    /// All phases in execution order.
    pub const ALL: [When; 6] = [
        When::Start,
        When::Groups,
        When::Thresholds,
        When::Synapses,
        When::Resets,
        When::End,
    ];

    /// Lower-case name used in configuration and log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Groups => "groups",
            Self::Thresholds => "thresholds",
            Self::Synapses => "synapses",
            Self::Resets => "resets",
            Self::End => "end",
        }
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown phase name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownPhase(pub String);

impl fmt::Display for UnknownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown scheduling phase '{}'", self.0)
    }
}

impl std::error::Error for UnknownPhase {}

impl FromStr for When {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        When::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_precedes_default_precedes_end() {
        assert!(When::Start < When::default());
        assert!(When::default() < When::End);
        assert_eq!(When::default(), When::Groups);
    }

    #[test]
    fn all_is_sorted() {
        let mut sorted = When::ALL;
        sorted.sort();
        assert_eq!(sorted, When::ALL);
    }

    #[test]
    fn parse_round_trips_names() {
        for w in When::ALL {
            assert_eq!(w.as_str().parse::<When>(), Ok(w));
        }
        assert_eq!(
            "middle".parse::<When>(),
            Err(UnknownPhase("middle".to_string()))
        );
    }
}
