//! The scheduler.
//!
//! A [`Network`] advances the units it contains in a globally consistent
//! time order. Each sub-step of a run picks the earliest clock time among
//! the clocks still before the run's end, updates every unit whose clock is
//! at that time, sorted by `(when, order, clock order, insertion index)`,
//! and then ticks those clocks.
//!
//! Membership is weak: a network never keeps a unit alive.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use cadence_core::{ClockId, UnitId};
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, info, trace, warn};

use crate::clock::SharedClock;
use crate::config::{ConfigError, SchedulerConfig};
use crate::error::RunError;
use crate::metrics::RunReport;
use crate::unit::{AnyUnit, Members, UpdateContext, WeakUnit};

// ── Stop flags ─────────────────────────────────────────────────────

thread_local! {
    static GLOBAL_STOP: Cell<bool> = const { Cell::new(false) };
}

/// Ask whichever network is running on this thread to stop after its
/// current sub-step.
pub(crate) fn request_global_stop() {
    GLOBAL_STOP.with(|flag| flag.set(true));
}

fn take_global_stop() -> bool {
    GLOBAL_STOP.with(|flag| flag.replace(false))
}

/// Cloneable handle that stops one network.
///
/// Obtained from [`Network::stop_handle`]; units can hold one to stop
/// the network from inside their update.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    /// Request a stop after the current sub-step.
    pub fn stop(&self) {
        self.0.set(true);
    }

    /// Whether a stop has been requested and not yet honoured.
    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }

    fn clear(&self) {
        self.0.set(false);
    }
}

// ── Network ────────────────────────────────────────────────────────

/// An ordered collection of units that runs them against their clocks.
#[derive(Debug)]
pub struct Network {
    objects: IndexMap<UnitId, WeakUnit>,
    t: f64,
    stop: StopHandle,
    config: SchedulerConfig,
    last_report: Option<RunReport>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

/// A live unit together with its insertion index, ready for sorting.
struct Scheduled {
    unit: AnyUnit,
    insertion: usize,
}

impl Network {
    /// An empty network at `t = 0` with the default configuration.
    pub fn new() -> Self {
        Self {
            objects: IndexMap::new(),
            t: 0.0,
            stop: StopHandle::default(),
            config: SchedulerConfig::default(),
            last_report: None,
        }
    }

    /// An empty network using `config`.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    pub(crate) fn with_valid_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    /// A network containing `members`.
    pub fn from_members(members: impl Members) -> Self {
        let mut net = Self::new();
        net.add(members);
        net
    }

    pub(crate) fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    /// Add units or nested groups of units. Units already present are
    /// ignored; insertion order is kept.
    pub fn add(&mut self, members: impl Members) {
        let mut units = Vec::new();
        members.collect_units(&mut units);
        for unit in units {
            self.objects
                .entry(unit.id())
                .or_insert_with(|| Rc::downgrade(&unit));
        }
    }

    /// Remove units. Removing an absent unit is a no-op.
    pub fn remove(&mut self, members: impl Members) {
        let mut units = Vec::new();
        members.collect_units(&mut units);
        for unit in units {
            self.objects.shift_remove(&unit.id());
        }
    }

    /// Whether `unit` is a live member.
    pub fn contains(&self, unit: &impl Members) -> bool {
        let mut units = Vec::new();
        unit.collect_units(&mut units);
        !units.is_empty()
            && units.iter().all(|u| {
                self.objects
                    .get(&u.id())
                    .is_some_and(|w| w.strong_count() > 0)
            })
    }

    /// Live members in insertion order. Dead memberships are pruned.
    pub fn objects(&mut self) -> Vec<AnyUnit> {
        self.objects.retain(|_, w| w.strong_count() > 0);
        self.objects.values().filter_map(|w| w.upgrade()).collect()
    }

    /// Number of live members.
    pub fn len(&self) -> usize {
        self.objects.values().filter(|w| w.strong_count() > 0).count()
    }

    /// Whether the network has no live members.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current network time.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// The configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Request a stop of the current run after its current sub-step.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// A handle that stops this network, for use inside unit updates.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Report of the most recent run.
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    /// Call `reinit` on every live member.
    pub fn reinit(&mut self) -> Result<(), RunError> {
        for unit in self.objects() {
            let mut body = unit.try_body_mut().ok_or_else(|| RunError::ReentrantUpdate {
                name: unit.name().to_string(),
            })?;
            body.reinit();
        }
        Ok(())
    }

    /// Live members paired with insertion index, in execution order.
    fn schedule(&mut self) -> Vec<Scheduled> {
        let mut scheduled: Vec<Scheduled> = self
            .objects()
            .into_iter()
            .enumerate()
            .map(|(insertion, unit)| Scheduled { unit, insertion })
            .collect();
        scheduled.sort_by_key(|s| {
            (
                s.unit.when(),
                s.unit.order(),
                s.unit.clock().order(),
                s.insertion,
            )
        });
        scheduled
    }

    /// Run for `duration` seconds of simulated time.
    ///
    /// Time accumulates across runs. After a completed run the network
    /// time is exactly `t + duration`; after a stopped or failed run it is
    /// the earliest clock time reached.
    pub fn run(&mut self, duration: f64) -> Result<RunReport, RunError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(RunError::InvalidDuration { duration });
        }
        let started = Instant::now();
        self.stop.clear();
        take_global_stop();

        let tolerance = self.config.tick_tolerance;
        let scheduled = self.schedule();
        let mut clocks: IndexMap<ClockId, SharedClock> = IndexMap::new();
        for s in &scheduled {
            let mut body = s.unit.try_body_mut().ok_or_else(|| RunError::ReentrantUpdate {
                name: s.unit.name().to_string(),
            })?;
            body.prepare();
            clocks
                .entry(s.unit.clock().id())
                .or_insert_with(|| Rc::clone(s.unit.clock()));
        }
        for clock in clocks.values() {
            clock.seat_within(self.t, tolerance);
        }

        let start_t = self.t;
        let end_t = start_t + duration;
        let mut report = RunReport {
            start_t,
            ..RunReport::default()
        };
        debug!(
            units = scheduled.len(),
            clocks = clocks.len(),
            start_t,
            end_t,
            "network run starting"
        );

        let outcome = self.run_loop(&scheduled, &clocks, end_t, &mut report);

        self.t = match outcome {
            Ok(false) => end_t,
            _ => clocks
                .values()
                .map(|c| c.t())
                .fold(end_t, f64::min),
        };
        report.stopped = matches!(outcome, Ok(true));
        report.end_t = self.t;
        report.total_us = started.elapsed().as_micros() as u64;
        debug!(
            substeps = report.substeps,
            updates = report.updates,
            skipped = report.skipped_inactive,
            t = self.t,
            "network run finished"
        );
        self.last_report = Some(report.clone());
        outcome.map(|_| report)
    }

    /// The sub-step loop. Returns whether the run was stopped early.
    fn run_loop(
        &self,
        scheduled: &[Scheduled],
        clocks: &IndexMap<ClockId, SharedClock>,
        end_t: f64,
        report: &mut RunReport,
    ) -> Result<bool, RunError> {
        let tolerance = self.config.tick_tolerance;
        loop {
            let pending = clocks.values().filter(|c| c.is_before(end_t, tolerance));
            let Some(now) = pending.map(|c| c.t()).reduce(f64::min) else {
                return Ok(false);
            };
            let due: SmallVec<[&SharedClock; 4]> = clocks
                .values()
                .filter(|c| c.is_before(end_t, tolerance) && c.t() - now <= tolerance * c.dt())
                .collect();
            trace!(t = now, clocks = due.len(), "sub-step");

            for s in scheduled {
                let unit = &s.unit;
                if !due.iter().any(|c| c.id() == unit.clock().id()) {
                    continue;
                }
                if !unit.is_active() {
                    report.skipped_inactive += 1;
                    continue;
                }
                let mut body = unit.try_body_mut().ok_or_else(|| RunError::ReentrantUpdate {
                    name: unit.name().to_string(),
                })?;
                let clock = unit.clock();
                let mut ctx = UpdateContext::new(clock.t(), clock.dt(), unit.name(), &self.stop);
                if let Err(reason) = body.update(&mut ctx) {
                    warn!(unit = unit.name(), t = now, error = %reason, "unit update failed");
                    return Err(RunError::UnitFailed {
                        name: unit.name().to_string(),
                        t: now,
                        reason,
                    });
                }
                report.updates += 1;
            }

            for clock in &due {
                clock.tick();
            }
            report.substeps += 1;

            let global = take_global_stop();
            if self.stop.is_stopped() || global {
                self.stop.clear();
                info!(t = now, global, "network run stopped");
                return Ok(true);
            }
        }
    }
}
