//! Core module containing the fundamental types of the engine

pub mod error;
pub mod field;
pub mod pluralize;
pub mod query;
pub mod record;
pub mod resource;
pub mod store;
pub mod validation;

pub use error::{
    Error, ErrorResponse, FieldViolation, FilterError, RegistryError, ResourceError,
    StorageError, StorageResult, TenancyResult,
};
pub use field::{FieldKind, FieldType, FieldValue};
pub use pluralize::Pluralizer;
pub use query::{Page, PageRequest, PaginationMeta, Sort, SortDirection};
pub use record::Record;
pub use resource::{FieldDef, Reference, RelationField, RelationKind, Resource, ResourceSchema};
pub use store::{Query, Repository, Transaction};
pub use validation::{NoValidation, Operation, Rule, RuleValidator, Validator};
