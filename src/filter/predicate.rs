//! Compiled, storage-independent query predicates

use crate::core::field::FieldValue;
use std::fmt;

/// Ordering operators usable in a compiled predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Lt => "<",
        }
    }
}

/// A boolean condition over the fields of one resource
///
/// Values are already coerced to the declared field types. A predicate has
/// no behavior of its own; each repository decides how to evaluate it.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field against a literal
    Compare {
        field: String,
        op: CompareOp,
        value: FieldValue,
    },
    /// Field against another field of the same row
    CompareFields {
        left: String,
        op: CompareOp,
        right: String,
    },
    /// Field cast to text matched against a LIKE pattern
    Like { field: String, pattern: String },
    /// Set membership
    In { field: String, values: Vec<FieldValue> },
    /// Inclusive range
    Between {
        field: String,
        low: FieldValue,
        high: FieldValue,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: FieldValue) -> Self {
        Predicate::Compare {
            field: field.into(),
            op: CompareOp::Eq,
            value,
        }
    }

    pub fn is_in(field: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Predicate::In {
            field: field.into(),
            values,
        }
    }

    /// Conjunction of all the given parts, skipping absent ones
    ///
    /// Nested conjunctions are flattened and a single part is returned as is.
    pub fn all(parts: impl IntoIterator<Item = Option<Predicate>>) -> Option<Predicate> {
        let mut flat = Vec::new();
        for part in parts.into_iter().flatten() {
            match part {
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Predicate::And(flat)),
        }
    }

    /// `self AND other`
    pub fn and(self, other: Predicate) -> Predicate {
        match Predicate::all([Some(self), Some(other)]) {
            Some(p) => p,
            None => Predicate::And(Vec::new()),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str| {
            f.write_str("(")?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{}", part)?;
            }
            f.write_str(")")
        };
        match self {
            Predicate::Compare { field, op, value } => {
                write!(f, "{} {} {}", field, op.symbol(), value)
            }
            Predicate::CompareFields { left, op, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Predicate::Like { field, pattern } => write!(f, "{} LIKE '{}'", field, pattern),
            Predicate::In { field, values } => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{} IN ({})", field, values.join(", "))
            }
            Predicate::Between { field, low, high } => {
                write!(f, "{} BETWEEN {} AND {}", field, low, high)
            }
            Predicate::And(parts) => join(f, parts, " AND "),
            Predicate::Or(parts) => join(f, parts, " OR "),
            Predicate::Not(inner) => write!(f, "NOT ({})", inner),
        }
    }
}
