//! Expression tree for parsed statements.
//!
//! Every analysis pass works on [`Expr`]; the textual form only exists at
//! the edges (parsing in, [`Display`](std::fmt::Display) out).

use indexmap::IndexSet;
use std::fmt;

/// Prefix operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation `-x`.
    Neg,
    /// Unary plus `+x`.
    Pos,
    /// Logical negation `not x`.
    Not,
}

/// Infix operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `and`
    And,
    /// `or`
    Or,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div | Self::Mod => 6,
            Self::Pow => 8,
        }
    }

    /// Whether the operator yields a boolean.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::And | Self::Or
        )
    }

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// Assignment operator of a statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    #[default]
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
}

impl AssignOp {
    /// The arithmetic operator an augmented assignment applies, if any.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            Self::Assign => None,
            Self::AddAssign => Some(BinaryOp::Add),
            Self::SubAssign => Some(BinaryOp::Sub),
            Self::MulAssign => Some(BinaryOp::Mul),
            Self::DivAssign => Some(BinaryOp::Div),
        }
    }

    /// Whether the target's previous value is read.
    pub fn is_augmented(self) -> bool {
        self != Self::Assign
    }

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Built-in functions callable from statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `exp(x)`
    Exp,
    /// `log(x)` (natural)
    Log,
    /// `log10(x)`
    Log10,
    /// `sqrt(x)`
    Sqrt,
    /// `abs(x)`
    Abs,
    /// `sin(x)`
    Sin,
    /// `cos(x)`
    Cos,
    /// `tan(x)`
    Tan,
    /// `floor(x)`
    Floor,
    /// `ceil(x)`
    Ceil,
    /// `clip(x, low, high)`
    Clip,
}

impl Builtin {
    /// Resolve a call head by name.
    pub fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "exp" => Self::Exp,
            "log" => Self::Log,
            "log10" => Self::Log10,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "clip" => Self::Clip,
            _ => return None,
        })
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Self::Clip => 3,
            _ => 1,
        }
    }
}

/// Parsed expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// `True` / `False`.
    Bool(bool),
    /// Reference to a named symbol.
    Name(String),
    /// Prefix operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Infix operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Function call. The head is not an identifier for dependency purposes.
    Call {
        /// Function name.
        func: String,
        /// Arguments in order.
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Shorthand for [`Expr::Name`].
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Shorthand for [`Expr::Binary`].
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Identifiers referenced by this expression, in first-occurrence order.
    pub fn identifiers(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        self.collect_identifiers(&mut out);
        out
    }

    /// Append referenced identifiers to `out`.
    pub fn collect_identifiers(&self, out: &mut IndexSet<String>) {
        match self {
            Self::Number(_) | Self::Bool(_) => {}
            Self::Name(name) => {
                if !out.contains(name) {
                    out.insert(name.clone());
                }
            }
            Self::Unary { operand, .. } => operand.collect_identifiers(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_identifiers(out);
                rhs.collect_identifiers(out);
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.collect_identifiers(out);
                }
            }
        }
    }

    /// Function names called anywhere in this expression.
    pub fn calls(&self) -> Vec<(&str, usize)> {
        let mut out = Vec::new();
        self.collect_calls(&mut out);
        out
    }

    fn collect_calls<'a>(&'a self, out: &mut Vec<(&'a str, usize)>) {
        match self {
            Self::Number(_) | Self::Bool(_) | Self::Name(_) => {}
            Self::Unary { operand, .. } => operand.collect_calls(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_calls(out);
                rhs.collect_calls(out);
            }
            Self::Call { func, args } => {
                out.push((func.as_str(), args.len()));
                for arg in args {
                    arg.collect_calls(out);
                }
            }
        }
    }

    /// Whether the expression is syntactically boolean-valued.
    pub fn is_boolean(&self) -> bool {
        match self {
            Self::Bool(_) => true,
            Self::Unary { op, .. } => *op == UnaryOp::Not,
            Self::Binary { op, .. } => op.is_boolean(),
            _ => false,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary { op: UnaryOp::Not, .. } => 3,
            Self::Unary { .. } => 7,
            _ => u8::MAX,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Name(name) => f.write_str(name),
            Self::Unary { op, operand } => {
                match op {
                    UnaryOp::Neg => f.write_str("-")?,
                    UnaryOp::Pos => f.write_str("+")?,
                    UnaryOp::Not => f.write_str("not ")?,
                }
                operand.fmt_child(f, operand.precedence() < self.precedence())
            }
            Self::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                // `**` is right-associative; everything else is left-associative.
                let (left_paren, right_paren) = if *op == BinaryOp::Pow {
                    (lhs.precedence() <= prec, rhs.precedence() < prec)
                } else {
                    (lhs.precedence() < prec, rhs.precedence() <= prec)
                };
                lhs.fmt_child(f, left_paren)?;
                write!(f, " {} ", op.symbol())?;
                rhs.fmt_child(f, right_paren)
            }
            Self::Call { func, args } => {
                write!(f, "{func}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// One parsed assignment statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    /// Assigned name.
    pub target: String,
    /// Assignment operator.
    pub op: AssignOp,
    /// Right-hand side.
    pub value: Expr,
    /// 1-based source line.
    pub line: usize,
}

impl Assignment {
    /// Identifiers read by this statement: the right-hand side, plus the
    /// target itself for augmented assignments.
    pub fn reads(&self) -> IndexSet<String> {
        let mut ids = self.value.identifiers();
        if self.op.is_augmented() && !ids.contains(&self.target) {
            ids.insert(self.target.clone());
        }
        ids
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.target, self.op, self.value)
    }
}
