//! The implicit, thread-scoped registry.
//!
//! Every [`Unit::new`](crate::Unit::new) registers here. [`run`] builds a
//! transient network over all live units and remembers the time it reached,
//! so that successive calls accumulate. Each thread has its own registry;
//! tests running on separate threads never see each other's units.

use std::cell::RefCell;

use tracing::debug;

use crate::clock::SharedClock;
use crate::config::{ConfigError, SchedulerConfig};
use crate::error::RunError;
use crate::metrics::RunReport;
use crate::registry::Registry;
use crate::unit::AnyUnit;

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::new());
}

/// Run every live registered unit for `duration` seconds.
///
/// The registry's borrow is released while the network runs, so units may
/// be created from inside an update.
pub fn run(duration: f64) -> Result<RunReport, RunError> {
    let mut net = REGISTRY.with_borrow_mut(Registry::network);
    debug!(units = net.len(), t = net.t(), duration, "implicit run");
    let result = net.run(duration);
    let reached = net.t();
    REGISTRY.with_borrow_mut(|r| r.set_t(reached));
    result
}

/// Stop whichever network is running on this thread after its current
/// sub-step.
pub fn stop() {
    crate::network::request_global_stop();
}

/// Forget every registered unit, reset the default clock, and return to
/// `t = 0`.
pub fn restore_initial_state() {
    REGISTRY.with_borrow_mut(Registry::reset);
}

/// Replace the registry with a fresh one using `config`.
///
/// Units created earlier keep the clock they were created with.
pub fn configure(config: SchedulerConfig) -> Result<(), ConfigError> {
    let registry = Registry::init(config)?;
    REGISTRY.set(registry);
    Ok(())
}

/// The default clock of the thread's registry.
pub fn default_clock() -> SharedClock {
    REGISTRY.with_borrow(Registry::default_clock)
}

/// Register `unit` with the thread's registry.
pub fn register(unit: &AnyUnit) {
    REGISTRY.with_borrow_mut(|r| r.register(unit));
}

/// Live units of the thread's registry.
pub fn units() -> Vec<AnyUnit> {
    REGISTRY.with_borrow_mut(Registry::units)
}

/// Time reached by the last implicit run.
pub fn t() -> f64 {
    REGISTRY.with_borrow(Registry::t)
}
