//! Cadence: a clocked discrete-time scheduler and statement compiler.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Cadence sub-crates, plus [`CodeUnit`], which ties the two halves
//! together: a schedulable unit whose update executes a compiled statement
//! block once per tick of its clock.
//!
//! # Quick start
//!
//! ```rust
//! use cadence::prelude::*;
//!
//! let table = SymbolTable::new()
//!     .with_variable(Variable::vector("v", Dtype::Float64))
//!     .with_variable(Variable::scalar("dt", Dtype::Float64).read_only())
//!     .with_subexpression("decay", "exp(-dt / 0.01)", Dtype::Float64)
//!     .unwrap();
//!
//! let mut ns = Namespace::new(3);
//! ns.fill_vector("v", 1.0);
//! let body = CodeUnit::compile("v = v * decay", &table, Dtype::Float64, ns).unwrap();
//! let cells = Unit::new(body, Schedule::default());
//!
//! magic::run(1e-3).unwrap();
//! let v = cells.borrow().namespace().vector("v").unwrap()[0];
//! assert!((v - (-0.1f64).exp()).abs() < 1e-9);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cadence-core` | IDs, phases, dtypes, update errors |
//! | [`codegen`] | `cadence-codegen` | Parser, symbol table, statement compiler, evaluator |
//! | [`engine`] | `cadence-engine` | Clocks, units, networks, the implicit registry |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core vocabulary shared by every crate (`cadence-core`).
pub use cadence_core as types;

/// Statement compiler and evaluator (`cadence-codegen`).
pub use cadence_codegen as codegen;

/// Clocked scheduler (`cadence-engine`).
pub use cadence_engine as engine;

pub use cadence_engine::magic;

pub mod code_unit;

pub use code_unit::CodeUnit;

/// Common imports for building and running a simulation.
///
/// ```rust
/// use cadence::prelude::*;
/// ```
pub mod prelude {
    pub use crate::code_unit::CodeUnit;
    pub use cadence_codegen::{make_statements, CompileError, Namespace, Statement, SymbolTable, Variable};
    pub use cadence_core::{Dtype, Scope, UpdateError, When};
    pub use cadence_engine::{
        magic, network_operation, Clock, Network, NetworkOperation, RunError, RunReport,
        Schedulable, Schedule, SchedulerConfig, SharedClock, StopHandle, Unit, UpdateContext,
    };
}
