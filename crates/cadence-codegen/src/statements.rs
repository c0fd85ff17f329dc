//! Statement compiler.
//!
//! [`make_statements`] turns a block of assignments over a [`SymbolTable`]
//! into two ordered lists: statements evaluated once per tick (scalar) and
//! statements evaluated once per element (vector). Every subexpression a
//! statement reads is materialised as a statement of its own immediately
//! before it, and re-materialised only when one of its primitive inputs has
//! been assigned since.
//!
//! Scalar statements all run before any vector statement. A scalar
//! statement that would overwrite a name an earlier vector statement reads
//! therefore cannot keep its place in the block and is rejected.

use std::fmt;

use cadence_core::{Dtype, Scope};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::ast::{AssignOp, Assignment, Builtin, Expr, UnaryOp};
use crate::error::CompileError;
use crate::parser::parse_statements;
use crate::resolve::SubexpressionGraph;
use crate::symbols::{Symbol, SymbolTable};

/// One compiled assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    /// Assigned name.
    pub var: String,
    /// Assignment operator.
    pub op: AssignOp,
    /// Right-hand side.
    pub expr: Expr,
    /// Type of the assigned value.
    pub dtype: Dtype,
    /// Whether the statement runs once per tick or once per element.
    pub scope: Scope,
    /// Whether the assigned name keeps this value for the rest of the block.
    ///
    /// For a materialised subexpression the value holds until the next
    /// materialisation of the same name, which is again `const`.
    pub constant: bool,
    /// Whether this statement materialises a subexpression.
    pub subexpression: bool,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constant {
            f.write_str("const ")?;
        }
        write!(f, "{} {} {}", self.var, self.op, self.expr)
    }
}

#[derive(Clone, Copy, Debug)]
struct Temporary {
    scope: Scope,
    dtype: Dtype,
}

// ── Compiler state ──────────────────────────────────────────────

struct Compiler<'t> {
    table: &'t SymbolTable,
    graph: SubexpressionGraph,
    precision: Dtype,
    assignments_per_target: IndexMap<String, usize>,
    temporaries: IndexMap<String, Temporary>,
    valid: IndexSet<String>,
    scalar: Vec<Statement>,
    vector: Vec<Statement>,
    /// Names read by the vector statements emitted so far.
    vector_reads: IndexSet<String>,
}

impl<'t> Compiler<'t> {
    fn new(table: &'t SymbolTable, precision: Dtype, assignments: &[Assignment]) -> Self {
        let mut assignments_per_target = IndexMap::new();
        for stmt in assignments {
            *assignments_per_target.entry(stmt.target.clone()).or_insert(0) += 1;
        }
        Self {
            table,
            graph: SubexpressionGraph::new(table),
            precision,
            assignments_per_target,
            temporaries: IndexMap::new(),
            valid: IndexSet::new(),
            scalar: Vec::new(),
            vector: Vec::new(),
            vector_reads: IndexSet::new(),
        }
    }

    fn push(&mut self, stmt: Statement) -> Result<(), CompileError> {
        trace!(statement = %stmt, scope = %stmt.scope, "emit");
        match stmt.scope {
            Scope::Scalar => {
                if self.vector_reads.contains(&stmt.var) {
                    return Err(CompileError::TypeConflict {
                        variable: stmt.var,
                        reason: "scalar statement after a vector statement that reads it".into(),
                    });
                }
                self.scalar.push(stmt);
            }
            Scope::Vector => {
                stmt.expr.collect_identifiers(&mut self.vector_reads);
                if stmt.op.is_augmented() {
                    self.vector_reads.insert(stmt.var.clone());
                }
                self.vector.push(stmt);
            }
        }
        Ok(())
    }

    fn check_target(&self, stmt: &Assignment) -> Result<(), CompileError> {
        match self.table.get(&stmt.target) {
            Some(Symbol::Subexpression(_)) => Err(CompileError::TypeConflict {
                variable: stmt.target.clone(),
                reason: "cannot assign to a subexpression".into(),
            }),
            Some(Symbol::Variable(v)) if v.read_only => Err(CompileError::TypeConflict {
                variable: stmt.target.clone(),
                reason: "variable is read-only".into(),
            }),
            _ => Ok(()),
        }
    }

    fn check_calls(stmt: &Assignment) -> Result<(), CompileError> {
        for (func, given) in stmt.value.calls() {
            let Some(builtin) = Builtin::lookup(func) else {
                return Err(CompileError::UnknownSymbol {
                    name: func.to_string(),
                });
            };
            if builtin.arity() != given {
                return Err(CompileError::Syntax {
                    line: stmt.line,
                    message: format!(
                        "{func}() takes {} argument(s), {given} given",
                        builtin.arity()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Scope of a subexpression: vector if any primitive input is vector.
    fn subexpression_scope(&self, name: &str) -> Result<Scope, CompileError> {
        let mut scope = Scope::Scalar;
        for input in self.graph.primitive_inputs(name) {
            match self.table.variable(&input) {
                Some(v) => scope = scope.join(v.scope),
                None => return Err(CompileError::UnknownSymbol { name: input }),
            }
        }
        Ok(scope)
    }

    fn identifier_scope(&self, name: &str) -> Result<Scope, CompileError> {
        if self.graph.contains(name) {
            return self.subexpression_scope(name);
        }
        if let Some(v) = self.table.variable(name) {
            return Ok(v.scope);
        }
        match self.temporaries.get(name) {
            Some(t) => Ok(t.scope),
            None => Err(CompileError::UnknownSymbol {
                name: name.to_string(),
            }),
        }
    }

    fn name_dtype(&self, name: &str) -> Option<Dtype> {
        self.table
            .get(name)
            .map(Symbol::dtype)
            .or_else(|| self.temporaries.get(name).map(|t| t.dtype))
    }

    /// Whether `expr` yields a boolean, including names of boolean dtype.
    fn yields_bool(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Name(name) => self.name_dtype(name).is_some_and(Dtype::is_bool),
            Expr::Unary {
                op: UnaryOp::Pos,
                operand,
            } => self.yields_bool(operand),
            other => other.is_boolean(),
        }
    }

    fn materialise(&mut self, needed: Vec<String>) -> Result<(), CompileError> {
        for name in needed {
            if self.valid.contains(&name) {
                continue;
            }
            let Some(sub) = self.table.subexpression(&name) else {
                continue;
            };
            let scope = self.subexpression_scope(&name)?;
            let stmt = Statement {
                var: name.clone(),
                op: AssignOp::Assign,
                expr: sub.expr().clone(),
                dtype: sub.dtype,
                scope,
                constant: true,
                subexpression: true,
            };
            self.push(stmt)?;
            self.valid.insert(name);
        }
        Ok(())
    }

    fn target_type(
        &mut self,
        stmt: &Assignment,
        rhs_scope: Scope,
    ) -> Result<(Scope, Dtype), CompileError> {
        let conflict = |reason: &str| CompileError::TypeConflict {
            variable: stmt.target.clone(),
            reason: reason.to_string(),
        };
        let (scope, dtype) = if let Some(v) = self.table.variable(&stmt.target) {
            if v.scope == Scope::Scalar && rhs_scope == Scope::Vector {
                return Err(conflict("scalar variable assigned a vector expression"));
            }
            (v.scope, v.dtype)
        } else if let Some(t) = self.temporaries.get(&stmt.target) {
            if t.scope == Scope::Scalar && rhs_scope == Scope::Vector {
                return Err(conflict("scalar temporary redefined with vector scope"));
            }
            (t.scope, t.dtype)
        } else {
            let dtype = if self.yields_bool(&stmt.value) {
                Dtype::Bool
            } else {
                self.precision
            };
            self.temporaries.insert(
                stmt.target.clone(),
                Temporary {
                    scope: rhs_scope,
                    dtype,
                },
            );
            (rhs_scope, dtype)
        };
        if dtype.is_bool() {
            if stmt.op.is_augmented() {
                return Err(conflict("augmented assignment to a boolean"));
            }
            if !self.yields_bool(&stmt.value) {
                return Err(conflict("boolean assigned a non-boolean expression"));
            }
        }
        Ok((scope, dtype))
    }

    fn compile(&mut self, stmt: &Assignment) -> Result<(), CompileError> {
        self.check_target(stmt)?;
        Self::check_calls(stmt)?;

        let reads = stmt.reads();
        let needed = self
            .graph
            .dependency_order(reads.iter().map(String::as_str))?;
        let mut rhs_scope = Scope::Scalar;
        for name in &reads {
            rhs_scope = rhs_scope.join(self.identifier_scope(name)?);
        }
        self.materialise(needed)?;

        let (scope, dtype) = self.target_type(stmt, rhs_scope)?;
        let is_temporary = !self.table.contains(&stmt.target);
        let assigned_once = self
            .assignments_per_target
            .get(&stmt.target)
            .is_some_and(|&n| n == 1);
        self.push(Statement {
            var: stmt.target.clone(),
            op: stmt.op,
            expr: stmt.value.clone(),
            dtype,
            scope,
            constant: is_temporary && assigned_once,
            subexpression: false,
        })?;

        let target = stmt.target.as_str();
        let graph = &self.graph;
        self.valid
            .retain(|sub| !graph.primitive_inputs(sub).contains(target));
        Ok(())
    }
}

/// Compile a statement block into `(scalar, vector)` statement lists.
///
/// `precision` is the dtype given to temporaries (names assigned in the
/// block that are not in `table`), unless the temporary is first assigned a
/// boolean expression.
pub fn make_statements(
    code: &str,
    table: &SymbolTable,
    precision: Dtype,
) -> Result<(Vec<Statement>, Vec<Statement>), CompileError> {
    let assignments = parse_statements(code)?;
    let mut compiler = Compiler::new(table, precision, &assignments);
    for stmt in &assignments {
        compiler.compile(stmt)?;
    }
    debug!(
        statements = assignments.len(),
        scalar = compiler.scalar.len(),
        vector = compiler.vector.len(),
        temporaries = compiler.temporaries.len(),
        "compiled statement block"
    );
    Ok((compiler.scalar, compiler.vector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Variable;

    fn vars(stmts: &[Statement]) -> String {
        stmts.iter().map(|s| s.var.as_str()).collect()
    }

    fn neuron_table() -> SymbolTable {
        SymbolTable::new()
            .with_variable(Variable::vector("v", Dtype::Float64))
            .with_variable(Variable::vector("g", Dtype::Float64))
            .with_variable(Variable::scalar("E", Dtype::Float64).read_only())
            .with_variable(Variable::scalar("dt", Dtype::Float64).read_only())
            .with_variable(Variable::scalar("gain", Dtype::Float64))
            .with_variable(Variable::vector("spiked", Dtype::Bool))
            .with_subexpression("I", "g * (E - v)", Dtype::Float64)
            .unwrap()
            .with_subexpression("decay", "exp(-dt)", Dtype::Float64)
            .unwrap()
    }

    #[test]
    fn subexpression_is_emitted_before_use() {
        let (scalar, vector) = make_statements("v += dt * I", &neuron_table(), Dtype::Float64).unwrap();
        assert!(scalar.is_empty());
        assert_eq!(vars(&vector), "Iv");
        assert!(vector[0].subexpression && vector[0].constant);
        assert!(!vector[1].subexpression && !vector[1].constant);
    }

    #[test]
    fn scalar_inputs_give_scalar_statements() {
        let code = "
            k = decay * 2
            gain = k
            v = v * k
        ";
        let (scalar, vector) = make_statements(code, &neuron_table(), Dtype::Float64).unwrap();
        assert_eq!(vars(&scalar), "decaykgain");
        assert_eq!(scalar[0].scope, Scope::Scalar);
        assert!(scalar[1].constant);
        assert_eq!(vars(&vector), "v");
    }

    #[test]
    fn scalar_target_fed_by_vector_is_rejected() {
        match make_statements("gain = v", &neuron_table(), Dtype::Float64) {
            Err(CompileError::TypeConflict { variable, .. }) => assert_eq!(variable, "gain"),
            other => panic!("expected TypeConflict, got {other:?}"),
        }
    }

    #[test]
    fn temporary_cannot_widen_its_scope() {
        let code = "k = dt\nk = v";
        assert!(matches!(
            make_statements(code, &neuron_table(), Dtype::Float64),
            Err(CompileError::TypeConflict { .. })
        ));
    }

    #[test]
    fn vector_temporary_may_take_scalar_value() {
        let code = "k = v\nk = dt\nv = k";
        let (scalar, vector) = make_statements(code, &neuron_table(), Dtype::Float32).unwrap();
        assert!(scalar.is_empty());
        assert_eq!(vars(&vector), "kkv");
        assert_eq!(vector[0].dtype, Dtype::Float32);
        assert!(!vector[0].constant);
    }

    #[test]
    fn assignments_to_protected_names_are_rejected() {
        let table = neuron_table();
        for code in ["I = 1", "E = 2"] {
            assert!(
                matches!(
                    make_statements(code, &table, Dtype::Float64),
                    Err(CompileError::TypeConflict { .. })
                ),
                "{code}"
            );
        }
    }

    #[test]
    fn unknown_names_and_functions_are_rejected() {
        let table = neuron_table();
        match make_statements("v = w + 1", &table, Dtype::Float64) {
            Err(CompileError::UnknownSymbol { name }) => assert_eq!(name, "w"),
            other => panic!("expected UnknownSymbol, got {other:?}"),
        }
        match make_statements("v = sigmoid(v)", &table, Dtype::Float64) {
            Err(CompileError::UnknownSymbol { name }) => assert_eq!(name, "sigmoid"),
            other => panic!("expected UnknownSymbol, got {other:?}"),
        }
        // A temporary must be defined before it is read.
        assert!(matches!(
            make_statements("v = k\nk = 1", &table, Dtype::Float64),
            Err(CompileError::UnknownSymbol { .. })
        ));
        assert!(matches!(
            make_statements("k += 1", &table, Dtype::Float64),
            Err(CompileError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn wrong_arity_is_a_syntax_error() {
        assert!(matches!(
            make_statements("v = clip(v, 0)", &neuron_table(), Dtype::Float64),
            Err(CompileError::Syntax { .. })
        ));
    }

    #[test]
    fn boolean_targets_need_boolean_expressions() {
        let table = neuron_table();
        assert!(make_statements("spiked = v > 1", &table, Dtype::Float64).is_ok());
        assert!(matches!(
            make_statements("spiked = v", &table, Dtype::Float64),
            Err(CompileError::TypeConflict { .. })
        ));
        assert!(matches!(
            make_statements("spiked += v > 1", &table, Dtype::Float64),
            Err(CompileError::TypeConflict { .. })
        ));
        let (_, vector) =
            make_statements("fired = v > 1\nspiked = fired", &table, Dtype::Float64).unwrap();
        assert_eq!(vector[0].dtype, Dtype::Bool);
    }

    #[test]
    fn scalar_overwrite_of_a_vector_read_is_rejected() {
        let table = neuron_table()
            .with_subexpression("s", "gain * 2", Dtype::Float64)
            .unwrap();
        // Re-materialising s would run before the first vector read of it.
        match make_statements("v = v * s\ngain = 10\nv = v * s", &table, Dtype::Float64) {
            Err(CompileError::TypeConflict { variable, .. }) => assert_eq!(variable, "s"),
            other => panic!("expected TypeConflict, got {other:?}"),
        }
        match make_statements("v = v * gain\ngain = 10", &table, Dtype::Float64) {
            Err(CompileError::TypeConflict { variable, .. }) => assert_eq!(variable, "gain"),
            other => panic!("expected TypeConflict, got {other:?}"),
        }
        // Scalar writes no vector statement has read yet keep their order.
        let (scalar, vector) =
            make_statements("v = v * 2\ngain = 10\nv = v * gain", &table, Dtype::Float64).unwrap();
        assert_eq!(vars(&scalar), "gain");
        assert_eq!(vars(&vector), "vv");
    }

    #[test]
    fn display_marks_constants() {
        let (_, vector) = make_statements("k = v * 2", &neuron_table(), Dtype::Float64).unwrap();
        assert_eq!(vector[0].to_string(), "const k = v * 2");
    }
}
