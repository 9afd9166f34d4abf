//! Resource declarations: the static schema every exposed type provides

use crate::core::error::RegistryError;
use crate::core::field::FieldType;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

/// A declared scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub field_type: FieldType,
}

impl FieldDef {
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }
}

/// Cardinality of a declared association
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    ManyToMany,
    OneToMany,
    ManyToOne,
}

/// A declared association field
///
/// `mapped_by` names the field on the other side that owns the association.
/// Fields carrying it are the inverse side and are never exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationField {
    pub name: &'static str,
    pub kind: RelationKind,
    pub target: &'static str,
    pub mapped_by: Option<&'static str>,
}

impl RelationField {
    /// An owning many-to-many association
    pub const fn many_to_many(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            kind: RelationKind::ManyToMany,
            target,
            mapped_by: None,
        }
    }

    /// The inverse side of an association owned by `target.mapped_by`
    pub const fn inverse(name: &'static str, target: &'static str, mapped_by: &'static str) -> Self {
        Self {
            name,
            kind: RelationKind::ManyToMany,
            target,
            mapped_by: Some(mapped_by),
        }
    }

    /// Whether this field owns the association it declares
    pub fn is_owning(&self) -> bool {
        self.mapped_by.is_none()
    }
}

/// Everything the engine needs to know about a resource type
#[derive(Debug)]
pub struct ResourceSchema {
    /// Singular resource name (e.g. "article")
    pub name: &'static str,
    /// Name of the identity field
    pub id_field: &'static str,
    /// Name of the tenant field
    pub tenant_field: &'static str,
    /// Scalar fields, including the identity and tenant fields
    pub fields: &'static [FieldDef],
    /// Association fields
    pub relations: &'static [RelationField],
}

impl ResourceSchema {
    /// Look up a scalar field by its exact name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared type of a scalar field
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.field(name).map(|f| f.field_type)
    }

    /// Look up an association field by name
    pub fn relation_field(&self, name: &str) -> Option<&RelationField> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Type of the identity field
    pub fn id_type(&self) -> Option<FieldType> {
        self.field_type(self.id_field)
    }

    /// Check that the schema describes a valid resource type
    ///
    /// Exactly one identity field and one tenant field must be declared, both
    /// as UUIDs, and field names must be unique across scalars and relations.
    pub fn check(&self) -> Result<(), RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidResourceType {
            resource: self.name.to_string(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("resource name is empty".to_string()));
        }
        if self.id_field == self.tenant_field {
            return Err(invalid(format!(
                "'{}' cannot be both identity and tenant field",
                self.id_field
            )));
        }
        for (role, name) in [("identity", self.id_field), ("tenant", self.tenant_field)] {
            match self.field_type(name) {
                Some(FieldType::Uuid) => {}
                Some(other) => {
                    return Err(invalid(format!(
                        "{} field '{}' must be a uuid, found {}",
                        role, name, other
                    )));
                }
                None => {
                    return Err(invalid(format!("{} field '{}' is not declared", role, name)));
                }
            }
        }

        let mut seen = HashSet::new();
        for name in self.fields.iter().map(|f| f.name) {
            if !seen.insert(name) {
                return Err(invalid(format!("field '{}' is declared more than once", name)));
            }
        }
        for relation in self.relations {
            if self.field(relation.name).is_some() {
                return Err(invalid(format!(
                    "relation '{}' shadows a scalar field",
                    relation.name
                )));
            }
        }
        Ok(())
    }
}

/// A placeholder for a row of another resource, carrying only type and id
///
/// Association collections hold references rather than loaded records, so
/// linking never needs to read the related row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: Uuid,
}

impl Reference {
    pub fn new(resource_type: impl Into<String>, id: Uuid) -> Self {
        Self {
            resource_type: resource_type.into(),
            id,
        }
    }
}

/// A typed resource exposed as a tenant-scoped collection
///
/// Implemented by [`impl_resource!`](crate::impl_resource) for declared types.
/// The typed value travels through `serde_json` to and from the engine's
/// dynamic records, and its own `validator` rules run before every write.
pub trait Resource: Serialize + DeserializeOwned + Validate + Clone + Send + Sync + 'static {
    /// Singular resource name, also used as the relation target name
    const NAME: &'static str;

    /// The static declaration of this resource type
    fn schema() -> &'static ResourceSchema;
}
