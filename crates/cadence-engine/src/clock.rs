//! Discrete simulation clocks.
//!
//! A [`Clock`] stores an integer tick index rather than a floating-point
//! time, so `t` is always exactly `tick * dt` and never drifts off the
//! grid. Reconciling an arbitrary time with the grid rounds within a small
//! tolerance (a fraction of one tick) instead of failing.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use cadence_core::ClockId;

use crate::config::DEFAULT_TICK_TOLERANCE;
use crate::error::ClockError;

/// A clock shared by every unit it drives.
pub type SharedClock = Rc<Clock>;

/// A fixed-step simulation clock.
#[derive(Debug)]
pub struct Clock {
    id: ClockId,
    dt: f64,
    order: i32,
    tick: Cell<u64>,
}

impl Clock {
    /// A clock at `t = 0` with step `dt`.
    ///
    /// `order` breaks ties between units of equal phase and order that run
    /// at the same time on different clocks; lower runs first.
    pub fn new(dt: f64, order: i32) -> Result<Self, ClockError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ClockError::InvalidDt { dt });
        }
        Ok(Self::with_valid_dt(dt, order))
    }

    /// Construct from a `dt` that has already passed validation.
    pub(crate) fn with_valid_dt(dt: f64, order: i32) -> Self {
        Self {
            id: ClockId::next(),
            dt,
            order,
            tick: Cell::new(0),
        }
    }

    /// [`Clock::new`] wrapped for sharing.
    pub fn shared(dt: f64, order: i32) -> Result<SharedClock, ClockError> {
        Self::new(dt, order).map(Rc::new)
    }

    /// Unique identifier.
    pub fn id(&self) -> ClockId {
        self.id
    }

    /// Step size in seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Tie-break order.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Current tick index.
    pub fn tick_index(&self) -> u64 {
        self.tick.get()
    }

    /// Current time, `tick_index * dt`.
    pub fn t(&self) -> f64 {
        self.tick.get() as f64 * self.dt
    }

    /// Advance by one step.
    pub fn tick(&self) {
        self.tick.set(self.tick.get() + 1);
    }

    /// Back to `t = 0`; `dt` is unchanged.
    pub fn reset(&self) {
        self.tick.set(0);
    }

    /// Position the clock on the tick nearest to `t`.
    pub fn set_t(&self, t: f64) -> Result<(), ClockError> {
        if !t.is_finite() || t < 0.0 {
            return Err(ClockError::InvalidTime { t });
        }
        self.tick.set((t / self.dt).round() as u64);
        Ok(())
    }

    /// Move forward to the last tick not exceeding `target`.
    ///
    /// A target within tolerance of a tick lands on that tick. A no-op if
    /// the clock is already there or beyond.
    pub fn advance_to(&self, target: f64) {
        let tick = self.last_tick_at_or_before(target, DEFAULT_TICK_TOLERANCE);
        if tick > self.tick.get() {
            self.tick.set(tick);
        }
    }

    /// Position the clock on the first tick at or after `start`, moving
    /// backwards if needed.
    pub fn seat(&self, start: f64) {
        self.seat_within(start, DEFAULT_TICK_TOLERANCE);
    }

    pub(crate) fn seat_within(&self, start: f64, tolerance: f64) {
        self.tick.set(self.first_tick_at_or_after(start, tolerance));
    }

    /// Whether the current tick lies before `end`.
    ///
    /// A time within `tolerance` ticks of `end` counts as reaching it.
    pub(crate) fn is_before(&self, end: f64, tolerance: f64) -> bool {
        self.tick.get() < self.first_tick_at_or_after(end, tolerance)
    }

    fn last_tick_at_or_before(&self, t: f64, tolerance: f64) -> u64 {
        let ticks = (t / self.dt + tolerance).floor();
        if ticks.is_finite() && ticks > 0.0 {
            ticks as u64
        } else {
            0
        }
    }

    fn first_tick_at_or_after(&self, t: f64, tolerance: f64) -> u64 {
        let ticks = (t / self.dt - tolerance).ceil();
        if ticks.is_finite() && ticks > 0.0 {
            ticks as u64
        } else {
            0
        }
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(dt={}, t={})", self.id, self.dt, self.t())
    }
}
