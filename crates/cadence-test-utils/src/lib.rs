//! Test utilities and unit fixtures for Cadence development.
//!
//! Provides small [`Schedulable`](cadence_engine::Schedulable) bodies that
//! count, record, stop, or fail, plus [`fresh_registry`] to put the
//! thread's implicit registry back in its initial state.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{Counter, FailAfter, Preparer, Recorder, SharedLog, Stopper};

use cadence_engine::{magic, SchedulerConfig};

/// Reset the thread's implicit registry to the default configuration with
/// no units and `t = 0`.
///
/// Tests normally run on their own thread; this also covers
/// `--test-threads=1`, where they share one.
pub fn fresh_registry() {
    magic::configure(SchedulerConfig::default()).expect("default config is valid");
}

/// Assert two times agree to within a nanosecond.
#[track_caller]
pub fn assert_time(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected t = {expected}, got {actual}"
    );
}
