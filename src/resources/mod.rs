//! The tenant-scoped resource engine
//!
//! - [`RelationCatalog`]: the exposable associations of one resource type
//! - [`ResourceRegistry`]: registered resources, their paths and relations
//! - [`ResourceEngine`]: the operations, addressed by resource name
//! - [`ResourceService`]: the same operations over one typed resource

pub mod catalog;
pub mod engine;
pub mod registry;
pub mod service;

pub use catalog::{RelationCatalog, RelationDescriptor};
pub use engine::ResourceEngine;
pub use registry::{
    PathTarget, RegistryBuilder, RegistryEntry, RelationEntry, ResourceRegistry,
};
pub use service::ResourceService;
