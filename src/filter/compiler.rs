//! Compile a [`FilterExpr`] into a [`Predicate`] against a resource schema
//!
//! The compiler resolves field names against the schema, coerces literals to
//! the declared field types and rejects any tree shape the filter language
//! does not support. It never touches storage and never mutates the tree.

use super::ast::{ComparisonOp, FilterExpr, Literal, LogicalOp};
use super::predicate::{CompareOp, Predicate};
use super::MAX_DEPTH;

/// Logical nesting a parsed filter can reach: an `||`, an `&&` and a `!` per
/// group level, then the `||` and `&&` inside the innermost group
const MAX_LOGICAL_DEPTH: usize = 3 * MAX_DEPTH + 2;
use crate::core::error::FilterError;
use crate::core::field::{FieldType, FieldValue};
use crate::core::resource::{FieldDef, ResourceSchema};

/// Compile an optional filter
///
/// `None` compiles to `None`: no filtering.
pub fn compile(
    expr: Option<&FilterExpr>,
    schema: &ResourceSchema,
) -> Result<Option<Predicate>, FilterError> {
    expr.map(|expr| Compiler { schema }.node(expr, 0)).transpose()
}

struct Compiler<'a> {
    schema: &'a ResourceSchema,
}

impl Compiler<'_> {
    /// `depth` counts the logical nodes above `expr`
    fn node(&self, expr: &FilterExpr, depth: usize) -> Result<Predicate, FilterError> {
        match expr {
            FilterExpr::Logical { .. } if depth >= MAX_LOGICAL_DEPTH => Err(FilterError::invalid(
                format!("filter nested deeper than {} levels", MAX_LOGICAL_DEPTH),
            )),
            FilterExpr::Logical { op, operands } => self.logical(*op, operands, depth + 1),
            FilterExpr::Comparison { op, operands } => self.comparison(*op, operands),
            FilterExpr::MethodCall { name, args } => self.method_call(name, args),
            FilterExpr::Literal(literal) => Err(FilterError::invalid(format!(
                "literal {} is not a condition",
                literal
            ))),
            FilterExpr::Field(name) => Err(FilterError::invalid(format!(
                "field '{}' is not a condition",
                name
            ))),
        }
    }

    fn logical(
        &self,
        op: LogicalOp,
        operands: &[FilterExpr],
        depth: usize,
    ) -> Result<Predicate, FilterError> {
        match op {
            LogicalOp::Not => match operands {
                [inner] => Ok(Predicate::Not(Box::new(self.node(inner, depth)?))),
                _ => Err(FilterError::invalid(format!(
                    "negation takes exactly one operand, got {}",
                    operands.len()
                ))),
            },
            LogicalOp::And | LogicalOp::Or => {
                if operands.len() < 2 {
                    return Err(FilterError::invalid(format!(
                        "{:?} needs at least two operands, got {}",
                        op,
                        operands.len()
                    )));
                }
                let parts = operands
                    .iter()
                    .map(|operand| self.node(operand, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if op == LogicalOp::And {
                    Predicate::And(parts)
                } else {
                    Predicate::Or(parts)
                })
            }
        }
    }

    fn comparison(&self, op: ComparisonOp, operands: &[FilterExpr]) -> Result<Predicate, FilterError> {
        let [left, right] = operands else {
            return Err(FilterError::invalid(format!(
                "comparison takes exactly two operands, got {}",
                operands.len()
            )));
        };
        let FilterExpr::Field(left) = left else {
            return Err(FilterError::invalid(
                "left side of a comparison must be a field",
            ));
        };
        let left = self.resolve(left)?;

        match right {
            FilterExpr::Field(right) => {
                let right = self.resolve(right)?;
                let Some(op) = ordering_op(op) else {
                    return Err(FilterError::invalid(format!(
                        "'matches' needs a pattern literal, not field '{}'",
                        right.name
                    )));
                };
                if !left.field_type.is_comparable_with(right.field_type) {
                    return Err(FilterError::TypeMismatch {
                        field: right.name.to_string(),
                        expected: left.field_type,
                        value: right.field_type.to_string(),
                    });
                }
                Ok(Predicate::CompareFields {
                    left: left.name.to_string(),
                    op,
                    right: right.name.to_string(),
                })
            }
            FilterExpr::Literal(literal) => match ordering_op(op) {
                Some(op) => Ok(Predicate::Compare {
                    field: left.name.to_string(),
                    op,
                    value: coerce(left, literal)?,
                }),
                None => match literal.raw() {
                    Some(pattern) => Ok(Predicate::Like {
                        field: left.name.to_string(),
                        pattern,
                    }),
                    None => Err(FilterError::invalid("'matches' needs a non-null pattern")),
                },
            },
            _ => Err(FilterError::invalid(
                "right side of a comparison must be a field or a literal",
            )),
        }
    }

    fn method_call(&self, name: &str, args: &[FilterExpr]) -> Result<Predicate, FilterError> {
        let is_in = name.eq_ignore_ascii_case("in");
        if !is_in && !name.eq_ignore_ascii_case("between") {
            return Err(FilterError::UnrecognizedMethod {
                name: name.to_string(),
            });
        }

        let Some((FilterExpr::Field(field), rest)) = args.split_first() else {
            return Err(FilterError::invalid(format!(
                "first argument of {}() must be a field",
                name
            )));
        };
        let field = self.resolve(field)?;
        let values = rest
            .iter()
            .map(|arg| match arg {
                FilterExpr::Literal(literal) => coerce(field, literal),
                _ => Err(FilterError::invalid(format!(
                    "arguments of {}() after the field must be literals",
                    name
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if is_in {
            if values.is_empty() {
                return Err(FilterError::invalid("in() needs at least one value"));
            }
            return Ok(Predicate::In {
                field: field.name.to_string(),
                values,
            });
        }

        match <[FieldValue; 2]>::try_from(values) {
            Ok([low, high]) => Ok(Predicate::Between {
                field: field.name.to_string(),
                low,
                high,
            }),
            Err(values) => Err(FilterError::invalid(format!(
                "between() needs exactly two values, got {}",
                values.len()
            ))),
        }
    }

    fn resolve(&self, name: &str) -> Result<&FieldDef, FilterError> {
        self.schema
            .field(name)
            .ok_or_else(|| FilterError::UnknownField {
                resource: self.schema.name.to_string(),
                field: name.to_string(),
            })
    }
}

fn ordering_op(op: ComparisonOp) -> Option<CompareOp> {
    match op {
        ComparisonOp::Eq => Some(CompareOp::Eq),
        ComparisonOp::Ne => Some(CompareOp::Ne),
        ComparisonOp::Ge => Some(CompareOp::Ge),
        ComparisonOp::Gt => Some(CompareOp::Gt),
        ComparisonOp::Le => Some(CompareOp::Le),
        ComparisonOp::Lt => Some(CompareOp::Lt),
        ComparisonOp::Matches => None,
    }
}

/// Coerce a literal to the declared type of `field`; null fits any type
fn coerce(field: &FieldDef, literal: &Literal) -> Result<FieldValue, FilterError> {
    let Some(raw) = literal.raw() else {
        return Ok(FieldValue::Null);
    };
    let coerced = match (field.field_type, literal) {
        (FieldType::Boolean, Literal::Number(_)) => None,
        (FieldType::Integer | FieldType::Float, Literal::Boolean(_)) => None,
        (field_type, _) => field_type.parse_text(&raw),
    };
    coerced.ok_or_else(|| FilterError::TypeMismatch {
        field: field.name.to_string(),
        expected: field.field_type,
        value: raw,
    })
}
