//! Typed error handling for tenancy-rs
//!
//! Every failure the engine can report is a variant of one category enum,
//! wrapped by the crate-level [`Error`].
//!
//! # Error Categories
//!
//! - [`FilterError`]: the filter expression could not be parsed or compiled
//! - [`ResourceError`]: per-request failures of the resource operations
//! - [`RegistryError`]: registration-time failures, fatal at startup
//! - [`StorageError`]: failures reported by the `Repository` collaborator
//!
//! # Example
//!
//! ```rust,ignore
//! match engine.get("article", tenant_id, id).await {
//!     Ok(record) => println!("{:?}", record),
//!     Err(Error::Resource(ResourceError::NotFound { ids, .. })) => {
//!         println!("missing: {:?}", ids);
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use crate::core::field::FieldType;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for tenancy-rs
#[derive(Debug, Error)]
pub enum Error {
    /// Filter parsing and compilation errors
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Resource operation errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Registration-time errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Storage backend errors
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Filter(_) => StatusCode::BAD_REQUEST,
            Error::Resource(e) => e.status_code(),
            Error::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Filter(e) => e.error_code(),
            Error::Resource(e) => e.error_code(),
            Error::Registry(e) => e.error_code(),
            Error::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Filter(FilterError::UnknownField { field, .. }) => {
                Some(serde_json::json!({ "field": field }))
            }
            Error::Resource(ResourceError::NotFound { resource, ids }) => {
                Some(serde_json::json!({ "resource": resource, "ids": ids }))
            }
            Error::Resource(ResourceError::ConstraintViolation(violations)) => {
                Some(serde_json::json!({ "fields": violations }))
            }
            _ => None,
        }
    }

    /// True when the error signals a broken invariant rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Resource(ResourceError::UnexpectedQueryResult { .. }) | Error::Registry(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Filter Errors
// =============================================================================

/// Errors raised while parsing or compiling a filter expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The expression text does not follow the filter grammar
    #[error("Invalid filter syntax at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// The expression tree has a shape the compiler does not support
    #[error("Invalid filter: {reason}")]
    InvalidFilter { reason: String },

    /// The expression names a field the resource does not declare
    #[error("Unknown field '{field}' on resource '{resource}'")]
    UnknownField { resource: String, field: String },

    /// The expression calls a method other than `in` or `between`
    #[error("Unrecognized filter method '{name}'")]
    UnrecognizedMethod { name: String },

    /// A literal cannot be coerced to the declared type of its field
    #[error("Value '{value}' cannot be used as {expected} for field '{field}'")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        value: String,
    },
}

impl FilterError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        FilterError::InvalidFilter {
            reason: reason.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FilterError::Syntax { .. } => "FILTER_SYNTAX_ERROR",
            FilterError::InvalidFilter { .. } => "INVALID_FILTER",
            FilterError::UnknownField { .. } => "UNKNOWN_FIELD",
            FilterError::UnrecognizedMethod { .. } => "UNRECOGNIZED_METHOD",
            FilterError::TypeMismatch { .. } => "TYPE_MISMATCH",
        }
    }
}

// =============================================================================
// Resource Errors
// =============================================================================

/// A single field validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors related to resource operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    /// The resource name is not registered
    #[error("Unknown resource type: {resource}")]
    UnknownResource { resource: String },

    /// No row matches the id/tenant combination, or some related ids are absent
    #[error("{resource} not found: {}", join_ids(.ids))]
    NotFound { resource: String, ids: Vec<Uuid> },

    /// The relation is not an owning many-to-many relation of the resource
    #[error("Unknown relation '{relation}' on resource '{resource}'")]
    UnknownRelation { resource: String, relation: String },

    /// A typed caller asked for related rows of the wrong resource type
    #[error("Relation '{relation}' links to '{actual}', not '{expected}'")]
    RelationTypeMismatch {
        relation: String,
        expected: String,
        actual: String,
    },

    /// The payload carries a tenant id other than the request's
    #[error("Tenant id mismatch: request tenant is '{expected}', payload tenant is '{actual}'")]
    TenantIdMismatch { expected: Uuid, actual: Uuid },

    /// The payload fails validation or a structural rule
    #[error("Constraint violation: {}", join_violations(.0))]
    ConstraintViolation(Vec<FieldViolation>),

    /// The store affected a number of rows a unique key cannot explain
    #[error("Unexpected query result on {resource}: expected at most {expected} row(s), got {actual}")]
    UnexpectedQueryResult {
        resource: String,
        expected: u64,
        actual: u64,
    },
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ResourceError {
    /// A single-field constraint violation
    pub fn constraint(field: impl Into<String>, message: impl Into<String>) -> Self {
        ResourceError::ConstraintViolation(vec![FieldViolation::new(field, message)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ResourceError::UnknownResource { .. } => StatusCode::NOT_FOUND,
            ResourceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ResourceError::UnknownRelation { .. } => StatusCode::NOT_FOUND,
            ResourceError::RelationTypeMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ResourceError::TenantIdMismatch { .. } => StatusCode::BAD_REQUEST,
            ResourceError::ConstraintViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ResourceError::UnexpectedQueryResult { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ResourceError::UnknownResource { .. } => "UNKNOWN_RESOURCE",
            ResourceError::NotFound { .. } => "RESOURCE_NOT_FOUND",
            ResourceError::UnknownRelation { .. } => "UNKNOWN_RELATION",
            ResourceError::RelationTypeMismatch { .. } => "RELATION_TYPE_MISMATCH",
            ResourceError::TenantIdMismatch { .. } => "TENANT_ID_MISMATCH",
            ResourceError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            ResourceError::UnexpectedQueryResult { .. } => "UNEXPECTED_QUERY_RESULT",
        }
    }
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised while registering resource types; fatal at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Resource '{resource}' is already registered")]
    ResourceAlreadyExists { resource: String },

    #[error("Path '{path}' is already registered")]
    PathAlreadyExists { path: String },

    #[error("Relation from '{owner}' to '{related}' is already registered")]
    RelatedResourceAlreadyExists { owner: String, related: String },

    #[error("Resource '{resource}' is not registered")]
    ResourceDoesNotExist { resource: String },

    #[error("Resource '{resource}' cannot be registered: {reason}")]
    InvalidResourceType { resource: String, reason: String },

    #[error("Resource '{resource}' declares relation '{relation}' more than once")]
    DuplicateRelation { resource: String, relation: String },
}

impl RegistryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::ResourceAlreadyExists { .. } => "RESOURCE_ALREADY_EXISTS",
            RegistryError::PathAlreadyExists { .. } => "PATH_ALREADY_EXISTS",
            RegistryError::RelatedResourceAlreadyExists { .. } => "RELATED_RESOURCE_ALREADY_EXISTS",
            RegistryError::ResourceDoesNotExist { .. } => "RESOURCE_DOES_NOT_EXIST",
            RegistryError::InvalidResourceType { .. } => "INVALID_RESOURCE_TYPE",
            RegistryError::DuplicateRelation { .. } => "DUPLICATE_RELATION",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// Transaction could not be opened, committed or rolled back
    #[error("Transaction error: {message}")]
    Transaction { message: String },

    /// Query execution error
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    /// Stored data could not be converted
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Backend not available
    #[error("Storage backend '{backend}' is unavailable")]
    Unavailable { backend: String },
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.into())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for tenancy-rs operations
pub type TenancyResult<T> = Result<T, Error>;

/// Result type returned by `Repository` implementations
pub type StorageResult<T> = Result<T, StorageError>;
