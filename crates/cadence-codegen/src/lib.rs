//! Statement compiler for Cadence.
//!
//! Turns blocks of assignment statements over a [`SymbolTable`] of
//! primitive variables and symbolic subexpressions into an ordered list of
//! imperative [`Statement`]s. Source text is parsed once into an
//! expression tree; all dependency analysis works on the tree.
//!
//! The three passes, leaf-first:
//!
//! - [`analyse_identifiers`]: defined, used-known, and dependent names.
//! - [`get_identifiers_recursively`]: transitive identifier closure
//!   through subexpressions, with cycle detection.
//! - [`make_statements`]: ordered scalar and vector statement lists with
//!   every subexpression materialised before it is read.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod ast;
pub mod error;
pub mod eval;
pub mod identifiers;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod statements;
pub mod symbols;

pub use ast::{AssignOp, Assignment, BinaryOp, Builtin, Expr, UnaryOp};
pub use error::CompileError;
pub use eval::{execute, Namespace};
pub use identifiers::{analyse_identifiers, IdentifierSets, KnownNames};
pub use parser::{parse_expression, parse_statements};
pub use resolve::{get_identifiers_recursively, SubexpressionGraph};
pub use statements::{make_statements, Statement};
pub use symbols::{Subexpression, Symbol, SymbolTable, Variable};
