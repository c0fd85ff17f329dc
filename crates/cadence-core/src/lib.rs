//! Core types for the Cadence simulation core.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the statement compiler and the scheduler: unit and
//! clock identifiers, the scheduling phase enumeration, numeric dtypes and
//! scopes, and the error a unit update may return.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dtype;
pub mod error;
pub mod id;
pub mod phase;

pub use dtype::{Dtype, Scope};
pub use error::UpdateError;
pub use id::{ClockId, UnitId};
pub use phase::{UnknownPhase, When};
