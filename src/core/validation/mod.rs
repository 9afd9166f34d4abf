//! Payload validation
//!
//! Every create and update payload passes through a [`Validator`] before any
//! transaction is opened. The engine ships [`NoValidation`] and the
//! configuration-driven [`RuleValidator`]; applications may plug their own.

pub mod rules;
pub mod validators;

pub use rules::{Rule, RuleValidator};

use crate::core::error::FieldViolation;
use crate::core::record::Record;
use crate::core::resource::ResourceSchema;
use std::fmt;

/// The write a payload is validated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Update => f.write_str("update"),
        }
    }
}

/// Declarative payload validation
pub trait Validator: Send + Sync {
    /// Check a decoded payload, reporting every violated constraint
    fn validate(
        &self,
        schema: &ResourceSchema,
        record: &Record,
        operation: Operation,
    ) -> Result<(), Vec<FieldViolation>>;
}

/// Accepts every payload
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl Validator for NoValidation {
    fn validate(
        &self,
        _schema: &ResourceSchema,
        _record: &Record,
        _operation: Operation,
    ) -> Result<(), Vec<FieldViolation>> {
        Ok(())
    }
}
