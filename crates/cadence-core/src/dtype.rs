//! Numeric dtypes and evaluation scopes for compiled statements.

use std::fmt;

/// Storage type of a variable or compiled statement target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// 32-bit IEEE float.
    Float32,
    /// 64-bit IEEE float.
    Float64,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Boolean.
    Bool,
}

impl Dtype {
    /// Whether this is a floating-point type.
    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Whether this is the boolean type.
    pub fn is_bool(self) -> bool {
        self == Self::Bool
    }

    /// C-style type name, used when rendering declarations.
    pub fn c_name(self) -> &'static str {
        match self {
            Self::Float32 => "float",
            Self::Float64 => "double",
            Self::Int32 => "int32_t",
            Self::Int64 => "int64_t",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

/// Evaluation scope of a variable or statement.
///
/// Scalar statements are evaluated once per tick, outside the per-element
/// loop; vector statements are evaluated once per element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Scope-invariant: one value shared by every element.
    Scalar,
    /// Per-element.
    #[default]
    Vector,
}

impl Scope {
    /// The wider of two scopes: vector wins over scalar.
    pub fn join(self, other: Scope) -> Scope {
        self.max(other)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("scalar"),
            Self::Vector => f.write_str("vector"),
        }
    }
}
