//! Strongly-typed identifiers for schedulable units and clocks.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`UnitId`] allocation.
static UNIT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Counter for unique [`ClockId`] allocation.
static CLOCK_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a schedulable unit.
///
/// Allocated from a monotonic atomic counter via [`UnitId::next`]. Two
/// distinct units always have different IDs, even after one of them has
/// been destroyed. Networks key their membership on this ID, so a slot
/// never aliases a dead unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    /// Allocate a fresh, unique unit ID.
    pub fn next() -> Self {
        Self(UNIT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Unique per-instance identifier for a clock.
///
/// Networks use it to collect the distinct clocks referenced by their
/// units; two units sharing a clock share its ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockId(u64);

impl ClockId {
    /// Allocate a fresh, unique clock ID.
    pub fn next() -> Self {
        Self(CLOCK_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clock#{}", self.0)
    }
}
