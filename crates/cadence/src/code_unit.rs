//! Compiled statement blocks as schedulable units.
//!
//! A [`CodeUnit`] owns a [`Namespace`] and the statement lists
//! [`make_statements`] produced for it. Every update publishes the clock's
//! `t` and `dt` as scalars, then executes the block: scalar statements once,
//! vector statements once per element. A failed update leaves the writes
//! made before the failing statement in the namespace, and the execution
//! count unchanged.

use cadence_codegen::{execute, make_statements, CompileError, Namespace, Statement, SymbolTable};
use cadence_core::{Dtype, UpdateError};
use cadence_engine::{Schedulable, UpdateContext};
use tracing::trace;

/// A unit that runs a compiled statement block on each tick.
#[derive(Debug)]
pub struct CodeUnit {
    source: String,
    scalar: Vec<Statement>,
    vector: Vec<Statement>,
    namespace: Namespace,
    executions: u64,
}

impl CodeUnit {
    /// Compile `code` against `table` and bind it to `namespace`.
    ///
    /// `precision` is the dtype of temporaries introduced by the block.
    /// Names the block reads must be present in `namespace` by the first
    /// update, apart from `t` and `dt`, which the unit supplies.
    pub fn compile(
        code: &str,
        table: &SymbolTable,
        precision: Dtype,
        namespace: Namespace,
    ) -> Result<Self, CompileError> {
        let (scalar, vector) = make_statements(code, table, precision)?;
        Ok(Self {
            source: code.to_string(),
            scalar,
            vector,
            namespace,
            executions: 0,
        })
    }

    /// The statement block this unit was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Statements run once per update.
    pub fn scalar_statements(&self) -> &[Statement] {
        &self.scalar
    }

    /// Statements run once per element per update.
    pub fn vector_statements(&self) -> &[Statement] {
        &self.vector
    }

    /// State the block reads and writes.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Mutable access to the state, for inputs and monitors.
    pub fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.namespace
    }

    /// How many times the block has been executed.
    pub fn executions(&self) -> u64 {
        self.executions
    }
}

impl Schedulable for CodeUnit {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
        self.namespace.set_scalar("t", ctx.t());
        self.namespace.set_scalar("dt", ctx.dt());
        trace!(
            unit = ctx.name(),
            t = ctx.t(),
            scalar = self.scalar.len(),
            vector = self.vector.len(),
            "executing statement block"
        );
        execute(&self.scalar, &self.vector, &mut self.namespace)?;
        self.executions += 1;
        Ok(())
    }
}
