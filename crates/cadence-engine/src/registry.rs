//! Registry of live units.
//!
//! A [`Registry`] remembers every unit created against it (weakly), owns
//! the default clock those units fall back to, and remembers the time its
//! last network run reached so successive runs accumulate.

use std::rc::Rc;

use cadence_core::UnitId;
use indexmap::IndexMap;
use tracing::debug;

use crate::clock::{Clock, SharedClock};
use crate::config::{ConfigError, SchedulerConfig};
use crate::network::Network;
use crate::unit::{AnyUnit, WeakUnit};

/// Explicit store of units, a default clock, and a current time.
#[derive(Debug)]
pub struct Registry {
    config: SchedulerConfig,
    default_clock: SharedClock,
    units: IndexMap<UnitId, WeakUnit>,
    t: f64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry with the default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(SchedulerConfig::default())
    }

    /// A registry using `config`.
    pub fn init(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: SchedulerConfig) -> Self {
        Self {
            default_clock: Rc::new(Clock::with_valid_dt(config.default_dt, 0)),
            config,
            units: IndexMap::new(),
            t: 0.0,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Remember `unit`. Registering twice is a no-op.
    pub fn register(&mut self, unit: &AnyUnit) {
        self.units
            .entry(unit.id())
            .or_insert_with(|| Rc::downgrade(unit));
    }

    /// Forget every unit, reset the default clock, and return to `t = 0`.
    pub fn reset(&mut self) {
        debug!(units = self.units.len(), "registry reset");
        self.units.clear();
        self.default_clock.reset();
        self.t = 0.0;
    }

    /// The clock units fall back to when none is given.
    pub fn default_clock(&self) -> SharedClock {
        Rc::clone(&self.default_clock)
    }

    /// Live registered units in registration order. Dead entries are pruned.
    pub fn units(&mut self) -> Vec<AnyUnit> {
        self.units.retain(|_, w| w.strong_count() > 0);
        self.units.values().filter_map(|w| w.upgrade()).collect()
    }

    /// Time reached by the last run.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Record the time reached by a run.
    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    /// A transient network over every live unit, starting at [`t`](Self::t).
    pub fn network(&mut self) -> Network {
        let units = self.units();
        let mut net = Network::with_valid_config(self.config.clone());
        net.add(units);
        net.set_t(self.t);
        net
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Schedulable, Schedule, Unit, UpdateContext};
    use cadence_core::UpdateError;

    struct Tick(u32);

    impl Schedulable for Tick {
        fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
            self.0 += 1;
            Ok(())
        }
    }

    #[test]
    fn init_validates_config() {
        let bad = SchedulerConfig {
            default_dt: 0.0,
            ..SchedulerConfig::default()
        };
        assert!(matches!(Registry::init(bad), Err(ConfigError::InvalidDt { .. })));
        let reg = Registry::init(SchedulerConfig {
            default_dt: 1e-3,
            ..SchedulerConfig::default()
        })
        .unwrap();
        assert_eq!(reg.default_clock().dt(), 1e-3);
    }

    #[test]
    fn network_runs_registered_units_and_time_accumulates() {
        let mut reg = Registry::new();
        let a = Unit::new_in(Tick(0), Schedule::default(), &mut reg);
        let b = Unit::new_in(Tick(0), Schedule::default(), &mut reg);
        for _ in 0..2 {
            let mut net = reg.network();
            net.run(1e-3).unwrap();
            reg.set_t(net.t());
        }
        assert_eq!(a.borrow().0, 20);
        assert_eq!(b.borrow().0, 20);
        assert!((reg.t() - 2e-3).abs() < 1e-15);
    }

    #[test]
    fn dead_units_are_pruned_and_reset_clears() {
        let mut reg = Registry::new();
        let a = Unit::new_in(Tick(0), Schedule::default(), &mut reg);
        {
            let _b = Unit::new_in(Tick(0), Schedule::default(), &mut reg);
            assert_eq!(reg.units().len(), 2);
        }
        assert_eq!(reg.units().len(), 1);
        reg.default_clock().tick();
        reg.set_t(0.5);
        reg.reset();
        assert!(reg.units().is_empty());
        assert_eq!(reg.default_clock().t(), 0.0);
        assert_eq!(reg.t(), 0.0);
        drop(a);
    }
}
