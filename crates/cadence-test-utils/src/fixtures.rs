//! Reusable unit fixtures.
//!
//! - [`Counter`] counts its updates.
//! - [`Recorder`] appends a tag to a [`SharedLog`] on every update.
//! - [`Stopper`] calls a stop function once its countdown runs out.
//! - [`Preparer`] records whether `prepare` and `reinit` were called.
//! - [`FailAfter`] fails deterministically after N successful updates.

use std::cell::RefCell;
use std::rc::Rc;

use cadence_core::UpdateError;
use cadence_engine::{Schedulable, UpdateContext};

/// Counts how many times it was updated.
#[derive(Debug, Default)]
pub struct Counter {
    pub count: u32,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Schedulable for Counter {
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
        self.count += 1;
        Ok(())
    }
}

/// A string several recorders append to, in update order.
#[derive(Clone, Debug, Default)]
pub struct SharedLog(Rc<RefCell<String>>);

impl SharedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, tag: &str) {
        self.0.borrow_mut().push_str(tag);
    }

    pub fn contents(&self) -> String {
        self.0.borrow().clone()
    }
}

/// Appends `tag` to `log` on every update.
pub struct Recorder {
    pub tag: String,
    pub log: SharedLog,
}

impl Recorder {
    pub fn new(tag: impl Into<String>, log: &SharedLog) -> Self {
        Self {
            tag: tag.into(),
            log: log.clone(),
        }
    }
}

impl Schedulable for Recorder {
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
        self.log.push(&self.tag);
        Ok(())
    }
}

/// Decrements `remaining` on every update and calls `stop` once it reaches
/// zero.
pub struct Stopper {
    pub remaining: u32,
    stop: Box<dyn FnMut()>,
}

impl Stopper {
    pub fn new(remaining: u32, stop: impl FnMut() + 'static) -> Self {
        Self {
            remaining,
            stop: Box::new(stop),
        }
    }
}

impl Schedulable for Stopper {
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            (self.stop)();
        }
        Ok(())
    }
}

/// Records calls to the lifecycle hooks.
#[derive(Debug, Default)]
pub struct Preparer {
    pub did_prepare: bool,
    pub did_reinit: bool,
}

impl Preparer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Schedulable for Preparer {
    fn prepare(&mut self) {
        self.did_prepare = true;
    }

    fn reinit(&mut self) {
        self.did_reinit = true;
    }

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
        Ok(())
    }
}

/// Succeeds `succeed_for` times, then fails on every later update.
#[derive(Debug)]
pub struct FailAfter {
    pub succeed_for: u32,
    pub calls: u32,
    pub reason: String,
}

impl FailAfter {
    pub fn new(succeed_for: u32, reason: impl Into<String>) -> Self {
        Self {
            succeed_for,
            calls: 0,
            reason: reason.into(),
        }
    }
}

impl Schedulable for FailAfter {
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
        self.calls += 1;
        if self.calls > self.succeed_for {
            return Err(UpdateError::failed(self.reason.clone()));
        }
        Ok(())
    }
}
