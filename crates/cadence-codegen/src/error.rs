//! Compile-time errors for statement analysis and compilation.
//!
//! Every variant is fatal for the block being compiled and is surfaced to
//! the caller; nothing is recovered locally.

use std::error::Error;
use std::fmt;

/// Errors from parsing, identifier analysis, and statement compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    /// The source text is not a valid statement block or expression.
    Syntax {
        /// 1-based line of the offending token.
        line: usize,
        /// What was expected and what was found.
        message: String,
    },
    /// An identifier is neither a known symbol nor a temporary defined
    /// earlier in the block, or a call names no known function.
    UnknownSymbol {
        /// The unresolved name.
        name: String,
    },
    /// A subexpression transitively references itself.
    CyclicDependency {
        /// The dependency path, starting and ending at the same name.
        cycle: Vec<String>,
    },
    /// An assignment is incompatible with its target's dtype or scope.
    TypeConflict {
        /// The assignment target.
        variable: String,
        /// Description of the conflict.
        reason: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { line, message } => write!(f, "syntax error on line {line}: {message}"),
            Self::UnknownSymbol { name } => write!(f, "unknown symbol '{name}'"),
            Self::CyclicDependency { cycle } => {
                write!(f, "cyclic subexpression dependency: {}", cycle.join(" -> "))
            }
            Self::TypeConflict { variable, reason } => {
                write!(f, "type conflict assigning '{variable}': {reason}")
            }
        }
    }
}

impl Error for CompileError {}
