//! Resource registry: paths, identity types and relations of every exposed type
//!
//! Built once at startup by [`RegistryBuilder`] and shared read-only behind an
//! `Arc`. Every registration error is fatal.

use super::catalog::RelationCatalog;
use crate::config::EngineConfig;
use crate::core::error::{RegistryError, ResourceError};
use crate::core::field::FieldType;
use crate::core::resource::{Resource, ResourceSchema};
use indexmap::IndexMap;
use std::collections::HashSet;
use uuid::Uuid;

/// A relation exposed under its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEntry {
    /// Relation name on the owner
    pub relation: String,
    /// Related resource name
    pub related: String,
    /// Path template, `{owner_path}/{id}/{relation}`
    pub path: String,
    pub related_id_type: FieldType,
}

/// Everything registered for one resource type
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub schema: &'static ResourceSchema,
    /// Collection path, without slashes at either end
    pub path: String,
    pub id_type: FieldType,
    pub catalog: RelationCatalog,
    /// Relations keyed by related resource name
    pub relations: IndexMap<String, RelationEntry>,
}

impl RegistryEntry {
    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    /// The relation entry for a relation name
    pub fn relation(&self, relation: &str) -> Option<&RelationEntry> {
        self.relations.values().find(|r| r.relation == relation)
    }
}

/// What a concrete request path points at
#[derive(Debug, Clone, Copy)]
pub enum PathTarget<'a> {
    /// `{path}` or `{path}/{id}`
    Resource {
        entry: &'a RegistryEntry,
        id: Option<Uuid>,
    },
    /// `{path}/{id}/{relation}`
    Relation {
        entry: &'a RegistryEntry,
        relation: &'a RelationEntry,
        id: Uuid,
    },
}

/// Registry of exposed resource types
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: IndexMap<&'static str, RegistryEntry>,
    paths: HashSet<String>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type at a collection path
    pub fn add(
        &mut self,
        schema: &'static ResourceSchema,
        path: &str,
        id_type: FieldType,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(schema.name) {
            return Err(RegistryError::ResourceAlreadyExists {
                resource: schema.name.to_string(),
            });
        }
        let path = normalize(path);
        if !self.paths.insert(path.clone()) {
            return Err(RegistryError::PathAlreadyExists { path });
        }

        self.entries.insert(
            schema.name,
            RegistryEntry {
                schema,
                path,
                id_type,
                catalog: RelationCatalog::default(),
                relations: IndexMap::new(),
            },
        );
        Ok(())
    }

    /// Register a relation of `owner` to `related` at a path
    pub fn add_related(
        &mut self,
        owner: &str,
        related: &str,
        relation: &str,
        path: &str,
        related_id_type: FieldType,
    ) -> Result<(), RegistryError> {
        let Some(entry) = self.entries.get_mut(owner) else {
            return Err(RegistryError::ResourceDoesNotExist {
                resource: owner.to_string(),
            });
        };
        let path = normalize(path);
        if self.paths.contains(&path) {
            return Err(RegistryError::PathAlreadyExists { path });
        }
        if entry.relations.contains_key(related) {
            return Err(RegistryError::RelatedResourceAlreadyExists {
                owner: owner.to_string(),
                related: related.to_string(),
            });
        }

        self.paths.insert(path.clone());
        entry.relations.insert(
            related.to_string(),
            RelationEntry {
                relation: relation.to_string(),
                related: related.to_string(),
                path,
                related_id_type,
            },
        );
        Ok(())
    }

    pub fn entry(&self, resource: &str) -> Option<&RegistryEntry> {
        self.entries.get(resource)
    }

    /// The entry of a resource, failing with `UnknownResource`
    pub fn require(&self, resource: &str) -> Result<&RegistryEntry, ResourceError> {
        self.entry(resource)
            .ok_or_else(|| ResourceError::UnknownResource {
                resource: resource.to_string(),
            })
    }

    pub fn schema(&self, resource: &str) -> Option<&'static ResourceSchema> {
        self.entry(resource).map(|e| e.schema)
    }

    pub fn catalog(&self, resource: &str) -> Option<&RelationCatalog> {
        self.entry(resource).map(|e| &e.catalog)
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.entries.contains_key(resource)
    }

    /// Entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// Every registered path, resource paths and relation templates alike
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Find what a concrete path addresses
    ///
    /// Accepts `{path}`, `{path}/{id}` and `{path}/{id}/{relation}`, where
    /// `{path}` may itself span several segments.
    pub fn resolve_path(&self, path: &str) -> Option<PathTarget<'_>> {
        let path = path.trim_matches('/');
        if let Some(entry) = self.entries.values().find(|e| e.path == path) {
            return Some(PathTarget::Resource { entry, id: None });
        }

        let (head, last) = path.rsplit_once('/')?;
        if let Some(entry) = self.entries.values().find(|e| e.path == head) {
            let id = Uuid::parse_str(last).ok()?;
            return Some(PathTarget::Resource {
                entry,
                id: Some(id),
            });
        }

        let (owner_path, id) = head.rsplit_once('/')?;
        let entry = self.entries.values().find(|e| e.path == owner_path)?;
        let relation = entry.relation(last)?;
        let id = Uuid::parse_str(id).ok()?;
        Some(PathTarget::Relation {
            entry,
            relation,
            id,
        })
    }

    fn set_catalog(&mut self, resource: &str, catalog: RelationCatalog) {
        if let Some(entry) = self.entries.get_mut(resource) {
            entry.catalog = catalog;
        }
    }
}

/// Collects resource declarations and builds the registry
///
/// # Example
///
/// ```rust,ignore
/// let registry = RegistryBuilder::new()
///     .with_config(config)
///     .register::<Article>()
///     .register::<Tag>()
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    schemas: Vec<&'static ResourceSchema>,
    config: EngineConfig,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use path overrides from configuration
    ///
    /// Every resource the configuration names must be registered.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn register<R: Resource>(self) -> Self {
        self.register_schema(R::schema())
    }

    pub fn register_schema(mut self, schema: &'static ResourceSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Validate every declaration, assign paths and build relation catalogs
    ///
    /// Relations are resolved after every type is added, so declaration order
    /// does not matter.
    pub fn build(self) -> Result<ResourceRegistry, RegistryError> {
        let mut registry = ResourceRegistry::new();

        for &schema in &self.schemas {
            schema.check()?;
            let id_type = schema
                .id_type()
                .ok_or_else(|| RegistryError::InvalidResourceType {
                    resource: schema.name.to_string(),
                    reason: "identity field is not declared".to_string(),
                })?;
            registry.add(schema, &self.config.path_for(schema.name), id_type)?;
        }

        if let Some(resource) = self
            .config
            .resources
            .keys()
            .find(|name| registry.schema(name).is_none())
        {
            return Err(RegistryError::ResourceDoesNotExist {
                resource: resource.clone(),
            });
        }

        for &schema in &self.schemas {
            let catalog = RelationCatalog::build(schema, |name| registry.schema(name))?;
            let owner_path = registry
                .entry(schema.name)
                .map(|e| e.path.clone())
                .unwrap_or_default();

            for descriptor in catalog.iter() {
                registry.add_related(
                    descriptor.owner,
                    descriptor.related,
                    descriptor.name,
                    &format!("{}/{{id}}/{}", owner_path, descriptor.name),
                    descriptor.related_id_type,
                )?;
            }

            tracing::info!(
                resource = %schema.name,
                path = %owner_path,
                relations = catalog.len(),
                "Registered resource"
            );
            registry.set_catalog(schema.name, catalog);
        }

        Ok(registry)
    }
}
