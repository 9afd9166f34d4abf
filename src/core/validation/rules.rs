//! Declarative validation rules, configured per resource and field

use super::validators::{self, FieldCheck};
use super::{Operation, Validator};
use crate::core::error::FieldViolation;
use crate::core::record::Record;
use crate::core::resource::ResourceSchema;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single validation rule as written in configuration
///
/// ```yaml
/// title: [required, { length: { min: 1, max: 200 } }]
/// status: [{ one_of: [draft, published] }]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Required,
    Positive,
    Length {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    OneOf(Vec<String>),
    Pattern(String),
}

impl Rule {
    /// Build the check this rule describes
    pub fn compile(&self) -> Result<FieldCheck, regex::Error> {
        let check: FieldCheck = match self {
            Rule::Required => Box::new(validators::required()),
            Rule::Positive => Box::new(validators::positive()),
            Rule::Length { min, max } => Box::new(validators::string_length(*min, *max)),
            Rule::Range { min, max } => Box::new(validators::range(*min, *max)),
            Rule::OneOf(allowed) => Box::new(validators::in_list(allowed.clone())),
            Rule::Pattern(pattern) => Box::new(validators::pattern(Regex::new(pattern)?)),
        };
        Ok(check)
    }
}

/// Runs configured rules against records of each resource
///
/// Resources without rules always pass. Rules apply alike to create and
/// update payloads.
#[derive(Default)]
pub struct RuleValidator {
    checks: IndexMap<String, Vec<(String, FieldCheck)>>,
}

impl RuleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for one field of a resource
    pub fn rule(mut self, resource: &str, field: &str, rule: &Rule) -> Result<Self, regex::Error> {
        let check = rule.compile()?;
        self.checks
            .entry(resource.to_string())
            .or_default()
            .push((field.to_string(), check));
        Ok(self)
    }

    /// Number of configured checks for a resource
    pub fn rule_count(&self, resource: &str) -> usize {
        self.checks.get(resource).map_or(0, Vec::len)
    }
}

impl Validator for RuleValidator {
    fn validate(
        &self,
        schema: &ResourceSchema,
        record: &Record,
        _operation: Operation,
    ) -> Result<(), Vec<FieldViolation>> {
        let Some(checks) = self.checks.get(schema.name) else {
            return Ok(());
        };
        let violations: Vec<FieldViolation> = checks
            .iter()
            .filter_map(|(field, check)| {
                check(field.as_str(), record.value(field))
                    .err()
                    .map(|message| FieldViolation::new(field.as_str(), message))
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl std::fmt::Debug for RuleValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: IndexMap<&str, usize> = self
            .checks
            .iter()
            .map(|(resource, checks)| (resource.as_str(), checks.len()))
            .collect();
        f.debug_struct("RuleValidator").field("checks", &counts).finish()
    }
}
