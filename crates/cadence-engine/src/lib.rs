//! Clocked scheduler for Cadence.
//!
//! Advances heterogeneous, independently clocked units in a globally
//! consistent time order. The pieces, leaf-first:
//!
//! - [`Clock`]: fixed-step clock storing an integer tick index.
//! - [`Unit`] / [`Schedulable`]: a body plus its clock, phase, and order.
//! - [`Network`]: runs its units against their clocks.
//! - [`NetworkOperation`]: a closure as a unit.
//! - [`Registry`] and [`magic`]: the store of live units behind the
//!   implicit [`magic::run`].
//!
//! Execution is single-threaded and cooperative; units and clocks are
//! `Rc`-shared and not `Send`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
pub mod magic;
pub mod metrics;
pub mod network;
pub mod operation;
pub mod registry;
pub mod unit;

pub use clock::{Clock, SharedClock};
pub use config::{ConfigError, SchedulerConfig};
pub use error::{ClockError, RunError};
pub use metrics::RunReport;
pub use network::{Network, StopHandle};
pub use operation::{network_operation, NetworkOperation};
pub use registry::Registry;
pub use unit::{AnyUnit, Members, Schedulable, Schedule, Unit, UnitCell, UpdateContext, WeakUnit};
