//! Filter expression tree
//!
//! Produced by [`parse`](super::parse) or built directly by a routing layer,
//! consumed by the compiler. Nodes are plain data and never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A literal exactly as written; numbers keep their raw text until coerced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Number(String),
    Boolean(bool),
    Null,
}

impl Literal {
    /// Raw text of the literal, `None` for null
    pub fn raw(&self) -> Option<String> {
        match self {
            Literal::String(s) | Literal::Number(s) => Some(s.clone()),
            Literal::Boolean(b) => Some(b.to_string()),
            Literal::Null => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Number(n) => f.write_str(n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// Comparison operators of the filter grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    Matches,
}

impl ComparisonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Matches => "matches",
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(ComparisonOp::Eq),
            "!=" => Ok(ComparisonOp::Ne),
            ">=" => Ok(ComparisonOp::Ge),
            ">" => Ok(ComparisonOp::Gt),
            "<=" => Ok(ComparisonOp::Le),
            "<" => Ok(ComparisonOp::Lt),
            s if s.eq_ignore_ascii_case("matches") => Ok(ComparisonOp::Matches),
            other => Err(format!("unknown comparison operator '{}'", other)),
        }
    }
}

/// Boolean connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

/// A node of the filter tree
///
/// Operand lists are not arity-checked here: a hand-built tree may carry a
/// comparison with three operands, and it is the compiler that rejects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    Literal(Literal),
    Field(String),
    Comparison {
        op: ComparisonOp,
        operands: Vec<FilterExpr>,
    },
    Logical {
        op: LogicalOp,
        operands: Vec<FilterExpr>,
    },
    MethodCall {
        name: String,
        args: Vec<FilterExpr>,
    },
}

impl FilterExpr {
    pub fn field(name: impl Into<String>) -> Self {
        FilterExpr::Field(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        FilterExpr::Literal(Literal::String(value.into()))
    }

    pub fn number(value: impl ToString) -> Self {
        FilterExpr::Literal(Literal::Number(value.to_string()))
    }

    pub fn boolean(value: bool) -> Self {
        FilterExpr::Literal(Literal::Boolean(value))
    }

    pub fn null() -> Self {
        FilterExpr::Literal(Literal::Null)
    }

    pub fn compare(op: ComparisonOp, left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Comparison {
            op,
            operands: vec![left, right],
        }
    }

    pub fn and(left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Logical {
            op: LogicalOp::And,
            operands: vec![left, right],
        }
    }

    pub fn or(left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Logical {
            op: LogicalOp::Or,
            operands: vec![left, right],
        }
    }

    pub fn not(inner: FilterExpr) -> Self {
        FilterExpr::Logical {
            op: LogicalOp::Not,
            operands: vec![inner],
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<FilterExpr>) -> Self {
        FilterExpr::MethodCall {
            name: name.into(),
            args,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[FilterExpr], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Renders the tree back in filter syntax, fully parenthesized
impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Literal(literal) => write!(f, "{}", literal),
            FilterExpr::Field(name) => f.write_str(name),
            FilterExpr::Comparison { op, operands } => {
                write_joined(f, operands, &format!(" {} ", op.symbol()))
            }
            FilterExpr::Logical {
                op: LogicalOp::Not,
                operands,
            } => {
                f.write_str("!(")?;
                write_joined(f, operands, ", ")?;
                f.write_str(")")
            }
            FilterExpr::Logical { op, operands } => {
                let sep = if *op == LogicalOp::And { " && " } else { " || " };
                f.write_str("(")?;
                write_joined(f, operands, sep)?;
                f.write_str(")")
            }
            FilterExpr::MethodCall { name, args } => {
                write!(f, "{}(", name)?;
                write_joined(f, args, ", ")?;
                f.write_str(")")
            }
        }
    }
}
