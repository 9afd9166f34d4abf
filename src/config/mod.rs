//! Configuration loading and management

use crate::core::pluralize::Pluralizer;
use crate::core::validation::{Rule, RuleValidator};
use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Page size limits applied to list operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the request does not ask for one
    pub default_limit: usize,

    /// Largest page size a request may ask for
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Configuration for one resource type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourceConfig {
    /// Collection path override (defaults to the pluralized resource name)
    pub path: Option<String>,

    /// Validation rules (field -> rules)
    pub validation: IndexMap<String, Vec<Rule>>,
}

/// Complete configuration for the resource engine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub pagination: PaginationConfig,

    /// Per-resource settings, keyed by resource name
    pub resources: IndexMap<String, ResourceConfig>,
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file '{}'", path))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> Result<()> {
        if self.pagination.max_limit == 0 {
            bail!("pagination.max_limit must be at least 1");
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            bail!(
                "pagination.default_limit ({}) exceeds pagination.max_limit ({})",
                self.pagination.default_limit,
                self.pagination.max_limit
            );
        }
        for (resource, config) in &self.resources {
            if let Some(path) = config.path.as_deref() {
                if path.trim_matches('/').is_empty() {
                    bail!("resource '{}' has an empty path", resource);
                }
            }
        }
        Ok(())
    }

    /// Collection path of a resource: the configured override or its plural name
    pub fn path_for(&self, resource: &str) -> String {
        self.resources
            .get(resource)
            .and_then(|r| r.path.as_deref())
            .map(|path| path.trim_matches('/').to_string())
            .unwrap_or_else(|| Pluralizer::path_segment(resource))
    }

    /// Build the validator described by the `validation` sections
    pub fn rule_validator(&self) -> Result<RuleValidator> {
        let mut validator = RuleValidator::new();
        for (resource, config) in &self.resources {
            for (field, rules) in &config.validation {
                for rule in rules {
                    validator = validator.rule(resource, field, rule).with_context(|| {
                        format!("invalid rule for '{}.{}'", resource, field)
                    })?;
                }
            }
        }
        Ok(validator)
    }
}
