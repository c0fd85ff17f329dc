//! Per-run metrics for the scheduler.
//!
//! [`RunReport`] is returned by every [`Network::run`](crate::Network::run)
//! and kept as the network's last report.

/// Counters and timing collected during a single run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    /// Number of sub-steps (distinct clock times) executed.
    pub substeps: u64,
    /// Number of unit updates invoked.
    pub updates: u64,
    /// Number of updates skipped because the unit was inactive.
    pub skipped_inactive: u64,
    /// Whether the run ended early on a stop request.
    pub stopped: bool,
    /// Wall-clock duration of the run, in microseconds.
    pub total_us: u64,
    /// Network time when the run started.
    pub start_t: f64,
    /// Network time when the run ended.
    pub end_t: f64,
}

impl RunReport {
    /// Simulated time covered by the run.
    pub fn simulated(&self) -> f64 {
        self.end_t - self.start_t
    }
}
