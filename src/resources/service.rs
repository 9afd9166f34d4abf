//! Typed access to one resource type

use super::engine::ResourceEngine;
use crate::core::error::{FieldViolation, ResourceError, TenancyResult};
use crate::core::query::{Page, PageRequest};
use crate::core::record::Record;
use crate::core::resource::Resource;
use crate::filter::parse;
use std::marker::PhantomData;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// The engine operations of one resource type, over typed values
///
/// Filters are accepted as text and parsed here. Payloads run their own
/// `validator` rules before reaching the engine.
///
/// # Example
///
/// ```rust,ignore
/// let articles = ResourceService::<Article>::new(engine.clone());
/// let page = articles
///     .list(tenant_id, Some("views >= 100"), &PageRequest::default())
///     .await?;
/// ```
pub struct ResourceService<R: Resource> {
    engine: ResourceEngine,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self::new(self.engine.clone())
    }
}

fn violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                FieldViolation::new(field.to_string(), message)
            })
        })
        .collect();
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations
}

impl<R: Resource> ResourceService<R> {
    pub fn new(engine: ResourceEngine) -> Self {
        Self {
            engine,
            _resource: PhantomData,
        }
    }

    pub fn engine(&self) -> &ResourceEngine {
        &self.engine
    }

    fn payload(value: &R) -> TenancyResult<Record> {
        value
            .validate()
            .map_err(|errors| ResourceError::ConstraintViolation(violations(&errors)))?;
        Record::from_resource(value)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: Option<&str>,
        page: &PageRequest,
    ) -> TenancyResult<Page<R>> {
        let filter = parse(filter.unwrap_or_default())?;
        let page = self
            .engine
            .list(R::NAME, tenant_id, filter.as_ref(), page)
            .await?;
        Ok(page.try_map(Record::into_resource)?)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> TenancyResult<R> {
        let record = self.engine.get(R::NAME, tenant_id, id).await?;
        Ok(record.into_resource()?)
    }

    pub async fn create(&self, tenant_id: Uuid, value: &R) -> TenancyResult<R> {
        let record = self
            .engine
            .create(R::NAME, tenant_id, Self::payload(value)?)
            .await?;
        Ok(record.into_resource()?)
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, value: &R) -> TenancyResult<R> {
        let record = self
            .engine
            .update(R::NAME, tenant_id, id, Self::payload(value)?)
            .await?;
        Ok(record.into_resource()?)
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> TenancyResult<()> {
        self.engine.delete(R::NAME, tenant_id, id).await
    }

    /// Related rows, decoded as `T`
    ///
    /// Fails with `RelationTypeMismatch` when the relation does not link to `T`.
    pub async fn get_related<T: Resource>(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        relation: &str,
        filter: Option<&str>,
        page: &PageRequest,
    ) -> TenancyResult<Page<T>> {
        let descriptor = self
            .engine
            .registry()
            .require(R::NAME)?
            .catalog
            .resolve(relation)?;
        if descriptor.related != T::NAME {
            return Err(ResourceError::RelationTypeMismatch {
                relation: relation.to_string(),
                expected: T::NAME.to_string(),
                actual: descriptor.related.to_string(),
            }
            .into());
        }

        let filter = parse(filter.unwrap_or_default())?;
        let page = self
            .engine
            .get_related(R::NAME, tenant_id, id, relation, filter.as_ref(), page)
            .await?;
        Ok(page.try_map(Record::into_resource)?)
    }

    pub async fn add_related(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        relation: &str,
        ids: &[Uuid],
    ) -> TenancyResult<R> {
        let record = self
            .engine
            .add_related(R::NAME, tenant_id, id, relation, ids)
            .await?;
        Ok(record.into_resource()?)
    }

    pub async fn delete_related(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        relation: &str,
        ids: &[Uuid],
    ) -> TenancyResult<R> {
        let record = self
            .engine
            .delete_related(R::NAME, tenant_id, id, relation, ids)
            .await?;
        Ok(record.into_resource()?)
    }
}
