//! # tenancy-rs
//!
//! Tenant-scoped, filterable collections of declared resource types, with
//! many-to-many relations managed by reference.
//!
//! ## Features
//!
//! - **Filter Expressions**: a small boolean language (`views >= 100 && in(status, "a", "b")`)
//!   parsed into a tree and compiled against a resource schema
//! - **Tenant Isolation**: every query is scoped to the caller's tenant; other
//!   tenants' rows behave as if they did not exist
//! - **Transactional Operations**: each operation commits once or rolls back
//!   entirely
//! - **Relation Catalog**: owning many-to-many associations exposed as
//!   `/{resource}/{id}/{relation}` sub-collections
//! - **Declarative Resources**: `impl_resource!` generates the struct and its schema
//! - **Configuration-Based**: paths, page sizes and validation rules from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tenancy::prelude::*;
//!
//! impl_resource!(Tag, "tag", { label: String });
//! impl_resource!(
//!     Article,
//!     "article",
//!     { title: String, views: i64 },
//!     relations { tags: Tag }
//! );
//!
//! let registry = RegistryBuilder::new()
//!     .register::<Article>()
//!     .register::<Tag>()
//!     .build()?;
//! let engine = ResourceEngine::new(Arc::new(registry), Arc::new(InMemoryRepository::new()));
//!
//! let articles = ResourceService::<Article>::new(engine.clone());
//! let created = articles
//!     .create(tenant_id, &Article { title: "Hello".into(), ..Default::default() })
//!     .await?;
//! let popular = articles
//!     .list(tenant_id, Some("views >= 100"), &PageRequest::default())
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod filter;
pub mod resources;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{
            Error, FieldViolation, FilterError, RegistryError, ResourceError, StorageError,
            TenancyResult,
        },
        field::{FieldKind, FieldType, FieldValue},
        pluralize::Pluralizer,
        query::{Page, PageRequest, PaginationMeta, Sort, SortDirection},
        record::Record,
        resource::{FieldDef, Reference, RelationField, RelationKind, Resource, ResourceSchema},
        store::{Query, Repository, Transaction},
        validation::{NoValidation, Operation, Rule, RuleValidator, Validator},
    };

    // === Filters ===
    pub use crate::filter::{CompareOp, FilterExpr, Literal, Predicate, compile, parse};

    // === Macros ===
    pub use crate::impl_resource;

    // === Engine ===
    pub use crate::resources::{
        PathTarget, RegistryBuilder, RelationCatalog, RelationDescriptor, ResourceEngine,
        ResourceRegistry, ResourceService,
    };

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryRepository;

    // === Config ===
    pub use crate::config::{EngineConfig, PaginationConfig, ResourceConfig};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, NaiveDate, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
    pub use validator::Validate;
}
