//! Symbol table: primitive variables and symbolic subexpressions.

use cadence_core::{Dtype, Scope};
use indexmap::IndexMap;

use crate::ast::Expr;
use crate::error::CompileError;
use crate::parser::parse_expression;

/// A primitive variable with opaque storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    /// Name used in statements.
    pub name: String,
    /// Storage type.
    pub dtype: Dtype,
    /// Scalar (shared) or vector (per-element).
    pub scope: Scope,
    /// Whether statements may assign to it.
    pub read_only: bool,
}

impl Variable {
    /// A writable per-element variable.
    pub fn vector(name: impl Into<String>, dtype: Dtype) -> Self {
        Self {
            name: name.into(),
            dtype,
            scope: Scope::Vector,
            read_only: false,
        }
    }

    /// A writable scope-invariant variable.
    pub fn scalar(name: impl Into<String>, dtype: Dtype) -> Self {
        Self {
            name: name.into(),
            dtype,
            scope: Scope::Scalar,
            read_only: false,
        }
    }

    /// Mark the variable read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// A named formula over other symbols, expanded at compile time.
///
/// The expression is parsed once at construction; analysis never looks at
/// the source text again.
#[derive(Clone, Debug, PartialEq)]
pub struct Subexpression {
    /// Name used in statements.
    pub name: String,
    /// Type of the computed value.
    pub dtype: Dtype,
    source: String,
    expr: Expr,
}

impl Subexpression {
    /// Parse `source` into a subexpression definition.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        dtype: Dtype,
    ) -> Result<Self, CompileError> {
        let source = source.into();
        let expr = parse_expression(&source)?;
        Ok(Self {
            name: name.into(),
            dtype,
            source,
            expr,
        })
    }

    /// The defining expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The source text the definition was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Entry in a [`SymbolTable`].
#[derive(Clone, Debug, PartialEq)]
pub enum Symbol {
    /// Primitive variable.
    Variable(Variable),
    /// Symbolic subexpression.
    Subexpression(Subexpression),
}

impl Symbol {
    /// The symbol's name.
    pub fn name(&self) -> &str {
        match self {
            Self::Variable(v) => &v.name,
            Self::Subexpression(s) => &s.name,
        }
    }

    /// The symbol's dtype.
    pub fn dtype(&self) -> Dtype {
        match self {
            Self::Variable(v) => v.dtype,
            Self::Subexpression(s) => s.dtype,
        }
    }
}

/// Insertion-ordered mapping from names to symbols.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a primitive variable.
    pub fn insert_variable(&mut self, variable: Variable) -> &mut Self {
        self.symbols
            .insert(variable.name.clone(), Symbol::Variable(variable));
        self
    }

    /// Parse and insert (or replace) a subexpression.
    pub fn insert_subexpression(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        dtype: Dtype,
    ) -> Result<&mut Self, CompileError> {
        let sub = Subexpression::new(name, source, dtype)?;
        self.symbols
            .insert(sub.name.clone(), Symbol::Subexpression(sub));
        Ok(self)
    }

    /// Builder form of [`insert_variable`](Self::insert_variable).
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.insert_variable(variable);
        self
    }

    /// Builder form of [`insert_subexpression`](Self::insert_subexpression).
    pub fn with_subexpression(
        mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        dtype: Dtype,
    ) -> Result<Self, CompileError> {
        self.insert_subexpression(name, source, dtype)?;
        Ok(self)
    }

    /// Look up a symbol.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Look up a primitive variable.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        match self.symbols.get(name) {
            Some(Symbol::Variable(v)) => Some(v),
            _ => None,
        }
    }

    /// Look up a subexpression.
    pub fn subexpression(&self, name: &str) -> Option<&Subexpression> {
        match self.symbols.get(name) {
            Some(Symbol::Subexpression(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether `name` is known.
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subexpression_is_parsed_once() {
        let sub = Subexpression::new("a", "b*b+d", Dtype::Float32).unwrap();
        assert_eq!(sub.source(), "b*b+d");
        assert_eq!(sub.expr().to_string(), "b * b + d");
    }

    #[test]
    fn malformed_subexpression_is_rejected() {
        assert!(matches!(
            Subexpression::new("a", "b*", Dtype::Float32),
            Err(CompileError::Syntax { .. })
        ));
    }

    #[test]
    fn lookups_distinguish_kinds() {
        let table = SymbolTable::new()
            .with_variable(Variable::scalar("tau", Dtype::Float64).read_only())
            .with_subexpression("I", "g * (E - v)", Dtype::Float64)
            .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.variable("tau").unwrap().read_only);
        assert!(table.subexpression("tau").is_none());
        assert!(table.subexpression("I").is_some());
        assert_eq!(table.get("I").unwrap().name(), "I");
        assert!(!table.contains("v"));
    }
}
