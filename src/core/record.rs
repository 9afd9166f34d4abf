//! Dynamic records: the row shape exchanged between engine and repository

use crate::core::error::{FieldViolation, ResourceError, StorageError};
use crate::core::field::FieldValue;
use crate::core::resource::{Reference, Resource, ResourceSchema};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use uuid::Uuid;

static NULL: FieldValue = FieldValue::Null;

/// One row of a resource: scalar values plus association collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: IndexMap<String, FieldValue>,
    relations: IndexMap<String, Vec<Reference>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// The value of a field, null when absent
    pub fn value(&self, field: &str) -> &FieldValue {
        self.values.get(field).unwrap_or(&NULL)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.values.insert(field.into(), value);
    }

    pub fn values(&self) -> &IndexMap<String, FieldValue> {
        &self.values
    }

    pub fn relations(&self) -> &IndexMap<String, Vec<Reference>> {
        &self.relations
    }

    /// References held by an association, empty when none were loaded
    pub fn references(&self, relation: &str) -> &[Reference] {
        self.relations
            .get(relation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn references_mut(&mut self, relation: &str) -> &mut Vec<Reference> {
        self.relations.entry(relation.to_string()).or_default()
    }

    pub fn set_references(&mut self, relation: impl Into<String>, references: Vec<Reference>) {
        self.relations.insert(relation.into(), references);
    }

    /// The identity value, if set
    pub fn id(&self, schema: &ResourceSchema) -> Option<Uuid> {
        self.get(schema.id_field).and_then(FieldValue::as_uuid)
    }

    /// The tenant value, if set
    pub fn tenant_id(&self, schema: &ResourceSchema) -> Option<Uuid> {
        self.get(schema.tenant_field).and_then(FieldValue::as_uuid)
    }

    /// Overwrite every scalar field from `other`, except the named ones
    ///
    /// Fields absent from `other` become null.
    pub fn copy_fields_from(&mut self, other: &Record, schema: &ResourceSchema, keep: &[&str]) {
        for field in schema.fields {
            if keep.contains(&field.name) {
                continue;
            }
            let value = other.get(field.name).cloned().unwrap_or(FieldValue::Null);
            self.set(field.name, value);
        }
    }

    /// Decode a JSON object payload against a schema
    ///
    /// Every declared field is present in the result (null when missing).
    /// Undeclared keys and values of the wrong type are reported together.
    pub fn from_json(schema: &ResourceSchema, payload: &Value) -> Result<Self, ResourceError> {
        let Some(object) = payload.as_object() else {
            return Err(ResourceError::constraint(
                schema.name,
                "payload must be a JSON object",
            ));
        };

        let mut record = Record::new();
        let mut violations = Vec::new();

        for field in schema.fields {
            let raw = object.get(field.name).unwrap_or(&Value::Null);
            match field.field_type.value_from_json(raw) {
                Some(value) => record.set(field.name, value),
                None => violations.push(FieldViolation::new(
                    field.name,
                    format!("expected {}, got {}", field.field_type, raw),
                )),
            }
        }

        for relation in schema.relations {
            let Some(raw) = object.get(relation.name) else {
                continue;
            };
            match decode_references(relation.target, raw) {
                Some(references) => record.set_references(relation.name, references),
                None => violations.push(FieldViolation::new(
                    relation.name,
                    "expected a list of references or ids",
                )),
            }
        }

        for key in object.keys() {
            if schema.field(key).is_none() && schema.relation_field(key).is_none() {
                violations.push(FieldViolation::new(key.as_str(), "unknown field"));
            }
        }

        if violations.is_empty() {
            Ok(record)
        } else {
            Err(ResourceError::ConstraintViolation(violations))
        }
    }

    /// Encode as a JSON object
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (field, value) in &self.values {
            object.insert(field.clone(), value.to_json());
        }
        for (relation, references) in &self.relations {
            let list = references
                .iter()
                .map(|r| serde_json::json!({ "type": r.resource_type, "id": r.id }))
                .collect();
            object.insert(relation.clone(), Value::Array(list));
        }
        Value::Object(object)
    }

    /// Convert a typed resource into a record
    pub fn from_resource<R: Resource>(resource: &R) -> Result<Self, crate::core::error::Error> {
        let payload = serde_json::to_value(resource)?;
        Ok(Self::from_json(R::schema(), &payload)?)
    }

    /// Convert this record into a typed resource
    pub fn into_resource<R: Resource>(self) -> Result<R, StorageError> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

fn decode_references(target: &str, raw: &Value) -> Option<Vec<Reference>> {
    if raw.is_null() {
        return Some(Vec::new());
    }
    raw.as_array()?
        .iter()
        .map(|item| match item {
            Value::String(id) => Uuid::parse_str(id)
                .ok()
                .map(|id| Reference::new(target, id)),
            Value::Object(_) => serde_json::from_value::<Reference>(item.clone())
                .ok()
                .filter(|r| r.resource_type == target),
            _ => None,
        })
        .collect()
}
