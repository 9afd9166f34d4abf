//! Relation catalog: the exposable associations of one resource type

use crate::core::error::{RegistryError, ResourceError};
use crate::core::field::FieldType;
use crate::core::resource::{Reference, RelationKind, ResourceSchema};
use indexmap::IndexMap;
use uuid::Uuid;

/// An owning many-to-many association between two registered resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Resource declaring the association
    pub owner: &'static str,
    /// Relation field name, also the path segment
    pub name: &'static str,
    /// Resource on the other side
    pub related: &'static str,
    /// Identity type of the related resource
    pub related_id_type: FieldType,
}

/// Relation name to descriptor, for the owning side only
///
/// Inverse fields (those naming a `mapped_by` owner), single-valued
/// associations and associations to unregistered resources are left out.
#[derive(Debug, Clone, Default)]
pub struct RelationCatalog {
    owner: &'static str,
    relations: IndexMap<&'static str, RelationDescriptor>,
}

impl RelationCatalog {
    /// Build the catalog of `schema`
    ///
    /// `lookup` answers the schema of registered resources; targets it does
    /// not know are skipped.
    pub fn build<'a>(
        schema: &ResourceSchema,
        lookup: impl Fn(&str) -> Option<&'a ResourceSchema>,
    ) -> Result<Self, RegistryError> {
        let mut relations = IndexMap::new();

        for field in schema.relations {
            if field.kind != RelationKind::ManyToMany || !field.is_owning() {
                continue;
            }
            let Some(target) = lookup(field.target) else {
                continue;
            };
            let Some(related_id_type) = target.id_type() else {
                continue;
            };
            let descriptor = RelationDescriptor {
                owner: schema.name,
                name: field.name,
                related: target.name,
                related_id_type,
            };
            if relations.insert(field.name, descriptor).is_some() {
                return Err(RegistryError::DuplicateRelation {
                    resource: schema.name.to_string(),
                    relation: field.name.to_string(),
                });
            }
        }

        Ok(Self {
            owner: schema.name,
            relations,
        })
    }

    pub fn get(&self, relation: &str) -> Option<&RelationDescriptor> {
        self.relations.get(relation)
    }

    /// Look up a relation, failing with `UnknownRelation`
    pub fn resolve(&self, relation: &str) -> Result<&RelationDescriptor, ResourceError> {
        self.get(relation).ok_or_else(|| ResourceError::UnknownRelation {
            resource: self.owner.to_string(),
            relation: relation.to_string(),
        })
    }

    /// A reference to a related row, built without reading it
    pub fn entity_reference(&self, relation: &str, id: Uuid) -> Result<Reference, ResourceError> {
        let descriptor = self.resolve(relation)?;
        Ok(Reference::new(descriptor.related, id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelationDescriptor> {
        self.relations.values()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
