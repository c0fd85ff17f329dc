//! Reference interpreter for compiled statements.
//!
//! Values are `f64` throughout; booleans are `0.0`/`1.0`. Each stored
//! value is coerced to the statement's dtype, and a non-finite result is an
//! error rather than a silently propagated NaN.

use cadence_core::{Dtype, UpdateError};
use indexmap::IndexMap;

use crate::ast::{BinaryOp, Builtin, Expr, UnaryOp};
use crate::statements::Statement;

/// Variable storage a block of statements runs against.
#[derive(Clone, Debug, Default)]
pub struct Namespace {
    len: usize,
    vectors: IndexMap<String, Vec<f64>>,
    scalars: IndexMap<String, f64>,
}

impl Namespace {
    /// Storage for `len` elements.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            ..Self::default()
        }
    }

    /// Number of elements per vector variable.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the namespace has zero elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert or replace a vector variable.
    pub fn set_vector(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), UpdateError> {
        let name = name.into();
        if values.len() != self.len {
            return Err(UpdateError::failed(format!(
                "vector '{name}' has {} elements, expected {}",
                values.len(),
                self.len
            )));
        }
        self.vectors.insert(name, values);
        Ok(())
    }

    /// Insert a vector variable filled with `value`.
    pub fn fill_vector(&mut self, name: impl Into<String>, value: f64) {
        self.vectors.insert(name.into(), vec![value; self.len]);
    }

    /// Insert or replace a scalar variable.
    pub fn set_scalar(&mut self, name: impl Into<String>, value: f64) {
        self.scalars.insert(name.into(), value);
    }

    /// A vector variable's values.
    pub fn vector(&self, name: &str) -> Option<&[f64]> {
        self.vectors.get(name).map(Vec::as_slice)
    }

    /// Mutable access to a vector variable's values.
    pub fn vector_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.vectors.get_mut(name).map(Vec::as_mut_slice)
    }

    /// A scalar variable's value.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.scalars.get(name).copied()
    }
}

struct Env<'a> {
    ns: &'a Namespace,
    scalar_temps: &'a IndexMap<String, f64>,
    locals: &'a IndexMap<String, f64>,
    index: Option<usize>,
}

impl Env<'_> {
    fn lookup(&self, name: &str) -> Result<f64, UpdateError> {
        if let Some(v) = self.locals.get(name).or_else(|| self.scalar_temps.get(name)) {
            return Ok(*v);
        }
        if let (Some(values), Some(i)) = (self.ns.vectors.get(name), self.index) {
            if let Some(v) = values.get(i) {
                return Ok(*v);
            }
        }
        self.ns
            .scalars
            .get(name)
            .copied()
            .ok_or_else(|| UpdateError::MissingVariable {
                variable: name.to_string(),
            })
    }

    fn eval(&self, expr: &Expr) -> Result<f64, UpdateError> {
        Ok(match expr {
            Expr::Number(v) => *v,
            Expr::Bool(b) => truth(*b),
            Expr::Name(name) => self.lookup(name)?,
            Expr::Unary { op, operand } => {
                let v = self.eval(operand)?;
                match op {
                    UnaryOp::Neg => -v,
                    UnaryOp::Pos => v,
                    UnaryOp::Not => truth(v == 0.0),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let a = self.eval(lhs)?;
                // Short-circuit like the surface language does.
                match op {
                    BinaryOp::And if a == 0.0 => return Ok(0.0),
                    BinaryOp::Or if a != 0.0 => return Ok(1.0),
                    _ => {}
                }
                let b = self.eval(rhs)?;
                binary(*op, a, b)
            }
            Expr::Call { func, args } => {
                let builtin = Builtin::lookup(func)
                    .ok_or_else(|| UpdateError::failed(format!("unknown function '{func}'")))?;
                if args.len() != builtin.arity() {
                    return Err(UpdateError::failed(format!(
                        "{func}() takes {} argument(s), {} given",
                        builtin.arity(),
                        args.len()
                    )));
                }
                let values = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                call(builtin, &values)
            }
        })
    }
}

fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn binary(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        // Floored modulo: the result takes the sign of the divisor.
        BinaryOp::Mod => a - b * (a / b).floor(),
        BinaryOp::Pow => a.powf(b),
        BinaryOp::Eq => truth(a == b),
        BinaryOp::Ne => truth(a != b),
        BinaryOp::Lt => truth(a < b),
        BinaryOp::Le => truth(a <= b),
        BinaryOp::Gt => truth(a > b),
        BinaryOp::Ge => truth(a >= b),
        BinaryOp::And => truth(a != 0.0 && b != 0.0),
        BinaryOp::Or => truth(a != 0.0 || b != 0.0),
    }
}

fn call(builtin: Builtin, args: &[f64]) -> f64 {
    let x = args[0];
    match builtin {
        Builtin::Exp => x.exp(),
        Builtin::Log => x.ln(),
        Builtin::Log10 => x.log10(),
        Builtin::Sqrt => x.sqrt(),
        Builtin::Abs => x.abs(),
        Builtin::Sin => x.sin(),
        Builtin::Cos => x.cos(),
        Builtin::Tan => x.tan(),
        Builtin::Floor => x.floor(),
        Builtin::Ceil => x.ceil(),
        Builtin::Clip => x.max(args[1]).min(args[2]),
    }
}

fn coerce(
    stmt: &Statement,
    current: Option<f64>,
    value: f64,
    index: Option<usize>,
) -> Result<f64, UpdateError> {
    let value = match (stmt.op.binary(), current) {
        (Some(op), Some(old)) => binary(op, old, value),
        (Some(_), None) => {
            return Err(UpdateError::MissingVariable {
                variable: stmt.var.clone(),
            })
        }
        (None, _) => value,
    };
    if !value.is_finite() {
        return Err(UpdateError::NonFinite {
            variable: stmt.var.clone(),
            index,
        });
    }
    Ok(match stmt.dtype {
        Dtype::Float32 => value as f32 as f64,
        Dtype::Float64 => value,
        Dtype::Int32 | Dtype::Int64 => value.trunc(),
        Dtype::Bool => truth(value != 0.0),
    })
}

/// Run compiled statements against `ns`.
///
/// Scalar statements run once; vector statements then run once per
/// element, in order. Names not present in `ns` (temporaries and
/// materialised subexpressions) live only for the duration of the call.
///
/// Writes are not staged. On error, every scalar write and every element
/// written before the failing statement stays in `ns`.
pub fn execute(
    scalar: &[Statement],
    vector: &[Statement],
    ns: &mut Namespace,
) -> Result<(), UpdateError> {
    let no_locals = IndexMap::new();
    let mut scalar_temps = IndexMap::new();
    for stmt in scalar {
        let env = Env {
            ns: &*ns,
            scalar_temps: &scalar_temps,
            locals: &no_locals,
            index: None,
        };
        let rhs = env.eval(&stmt.expr)?;
        let stored = !stmt.subexpression && ns.scalars.contains_key(&stmt.var);
        let current = if stored {
            ns.scalars.get(&stmt.var).copied()
        } else {
            scalar_temps.get(&stmt.var).copied()
        };
        let value = coerce(stmt, current, rhs, None)?;
        if stored {
            ns.scalars.insert(stmt.var.clone(), value);
        } else {
            scalar_temps.insert(stmt.var.clone(), value);
        }
    }

    let mut locals = IndexMap::new();
    for i in 0..ns.len {
        locals.clear();
        for stmt in vector {
            let env = Env {
                ns: &*ns,
                scalar_temps: &scalar_temps,
                locals: &locals,
                index: Some(i),
            };
            let rhs = env.eval(&stmt.expr)?;
            let stored = !stmt.subexpression && ns.vectors.contains_key(&stmt.var);
            if stored {
                let current = ns.vectors.get(&stmt.var).and_then(|v| v.get(i)).copied();
                let value = coerce(stmt, current, rhs, Some(i))?;
                if let Some(slot) = ns.vectors.get_mut(&stmt.var).and_then(|v| v.get_mut(i)) {
                    *slot = value;
                }
            } else {
                let current = locals
                    .get(&stmt.var)
                    .or_else(|| scalar_temps.get(&stmt.var))
                    .copied();
                let value = coerce(stmt, current, rhs, Some(i))?;
                locals.insert(stmt.var.clone(), value);
            }
        }
    }
    Ok(())
}
