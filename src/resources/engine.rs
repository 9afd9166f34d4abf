//! Tenant-scoped resource operations over a transactional repository
//!
//! Every operation addresses a resource by its registered name and works on
//! dynamic [`Record`]s. Filters, orderings and payloads are checked before a
//! transaction is opened; once one is open, it is committed on success and
//! rolled back on any failure, so a failed operation leaves no trace.

use super::registry::{RegistryEntry, ResourceRegistry};
use crate::config::{EngineConfig, PaginationConfig};
use crate::core::error::{Error, ResourceError, TenancyResult};
use crate::core::field::FieldValue;
use crate::core::query::{Page, PageRequest, PaginationMeta, Sort};
use crate::core::record::Record;
use crate::core::resource::ResourceSchema;
use crate::core::store::{Query, Repository, Transaction};
use crate::core::validation::{NoValidation, Operation, Validator};
use crate::filter::{FilterExpr, Predicate, compile};
use indexmap::IndexSet;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Executes list/get/create/update/delete and relation operations
///
/// Stateless apart from the shared registry; cheap to clone and safe to
/// share across tasks.
#[derive(Clone)]
pub struct ResourceEngine {
    registry: Arc<ResourceRegistry>,
    repository: Arc<dyn Repository>,
    validator: Arc<dyn Validator>,
    pagination: PaginationConfig,
}

/// Rows matching one tenant
fn tenant_scope(schema: &ResourceSchema, tenant_id: Uuid) -> Predicate {
    Predicate::eq(schema.tenant_field, FieldValue::Uuid(tenant_id))
}

/// The single row with this identity under this tenant
fn scoped_id(schema: &ResourceSchema, tenant_id: Uuid, id: Uuid) -> Predicate {
    Predicate::eq(schema.id_field, FieldValue::Uuid(id)).and(tenant_scope(schema, tenant_id))
}

fn unexpected(schema: &ResourceSchema, actual: usize) -> Error {
    ResourceError::UnexpectedQueryResult {
        resource: schema.name.to_string(),
        expected: 1,
        actual: actual as u64,
    }
    .into()
}

fn not_found(resource: &str, ids: Vec<Uuid>) -> Error {
    ResourceError::NotFound {
        resource: resource.to_string(),
        ids,
    }
    .into()
}

/// Load one row by identity under a tenant
async fn load_scoped(
    tx: &mut dyn Transaction,
    schema: &ResourceSchema,
    tenant_id: Uuid,
    id: Uuid,
) -> TenancyResult<Record> {
    let query = Query::filtered(scoped_id(schema, tenant_id, id)).limit(2);
    let mut rows = tx.find(schema, &query).await?;
    match rows.len() {
        0 => Err(not_found(schema.name, vec![id])),
        1 => Ok(rows.remove(0)),
        n => Err(unexpected(schema, n)),
    }
}

/// Commit on success, roll back on failure
async fn finish<T>(
    tx: Box<dyn Transaction>,
    operation: &'static str,
    resource: &str,
    outcome: TenancyResult<T>,
) -> TenancyResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            tracing::debug!(operation, resource = %resource, "Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(
                    operation,
                    resource = %resource,
                    error = %rollback,
                    "Rollback failed"
                );
            }
            if err.is_fatal() {
                tracing::error!(operation, resource = %resource, error = %err, "Invariant violated");
            } else {
                tracing::debug!(operation, resource = %resource, error = %err, "Transaction rolled back");
            }
            Err(err)
        }
    }
}

fn collapse(ids: &[Uuid]) -> Vec<Uuid> {
    ids.iter().copied().collect::<IndexSet<_>>().into_iter().collect()
}

impl ResourceEngine {
    /// Create an engine with no payload validation and default page sizes
    pub fn new(registry: Arc<ResourceRegistry>, repository: Arc<dyn Repository>) -> Self {
        Self {
            registry,
            repository,
            validator: Arc::new(NoValidation),
            pagination: PaginationConfig::default(),
        }
    }

    /// Create an engine with the validation rules and page sizes of `config`
    ///
    /// Fails when a rule names a resource the registry lacks or a field its
    /// schema does not declare.
    pub fn from_config(
        registry: Arc<ResourceRegistry>,
        repository: Arc<dyn Repository>,
        config: &EngineConfig,
    ) -> anyhow::Result<Self> {
        for (resource, settings) in &config.resources {
            let Some(schema) = registry.schema(resource) else {
                anyhow::bail!("configured resource '{}' is not registered", resource);
            };
            if let Some(field) = settings
                .validation
                .keys()
                .find(|field| schema.field(field).is_none())
            {
                anyhow::bail!(
                    "validation rules for '{}.{}' name an undeclared field",
                    resource,
                    field
                );
            }
        }

        Ok(Self::new(registry, repository)
            .with_validator(config.rule_validator()?)
            .with_pagination(config.pagination.clone()))
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    fn entry(&self, resource: &str) -> TenancyResult<&RegistryEntry> {
        Ok(self.registry.require(resource)?)
    }

    fn validate(
        &self,
        schema: &ResourceSchema,
        payload: &Record,
        operation: Operation,
    ) -> TenancyResult<()> {
        self.validator
            .validate(schema, payload, operation)
            .map_err(|violations| ResourceError::ConstraintViolation(violations).into())
    }

    /// List rows of a tenant, filtered, ordered and paginated
    ///
    /// Rows are ordered by the requested sort key, then by identity.
    pub async fn list(
        &self,
        resource: &str,
        tenant_id: Uuid,
        filter: Option<&FilterExpr>,
        page: &PageRequest,
    ) -> TenancyResult<Page<Record>> {
        tracing::debug!(operation = "list", resource = %resource, tenant = %tenant_id, "Listing resources");
        let schema = self.entry(resource)?.schema;
        let filter = compile(filter, schema)?;
        let sort = page.ordering(schema)?;
        let predicate = Predicate::all([Some(tenant_scope(schema, tenant_id)), filter]);

        let mut tx = self.repository.begin().await?;
        let outcome = self
            .query_page(tx.as_mut(), schema, predicate, sort, page)
            .await;
        finish(tx, "list", resource, outcome).await
    }

    async fn query_page(
        &self,
        tx: &mut dyn Transaction,
        schema: &ResourceSchema,
        predicate: Option<Predicate>,
        sort: Vec<Sort>,
        page: &PageRequest,
    ) -> TenancyResult<Page<Record>> {
        let limit = page.limit(&self.pagination);
        let total = tx.count(schema, predicate.as_ref()).await?;
        let query = Query {
            predicate,
            sort,
            offset: page.offset(&self.pagination),
            limit: Some(limit),
        };
        let data = tx.find(schema, &query).await?;
        Ok(Page {
            data,
            pagination: PaginationMeta::new(page.page(), limit, total),
        })
    }

    /// Fetch one row; rows of other tenants are reported as not found
    pub async fn get(&self, resource: &str, tenant_id: Uuid, id: Uuid) -> TenancyResult<Record> {
        tracing::debug!(operation = "get", resource = %resource, tenant = %tenant_id, id = %id, "Fetching resource");
        let schema = self.entry(resource)?.schema;

        let mut tx = self.repository.begin().await?;
        let outcome = load_scoped(tx.as_mut(), schema, tenant_id, id).await;
        finish(tx, "get", resource, outcome).await
    }

    /// Insert a new row under a tenant with a fresh identity
    ///
    /// The payload must not carry an identity or association references, and
    /// any tenant it carries must be the request's.
    pub async fn create(
        &self,
        resource: &str,
        tenant_id: Uuid,
        payload: Record,
    ) -> TenancyResult<Record> {
        tracing::debug!(operation = "create", resource = %resource, tenant = %tenant_id, "Creating resource");
        let schema = self.entry(resource)?.schema;

        self.validate(schema, &payload, Operation::Create)?;
        if !payload.value(schema.id_field).is_null() {
            return Err(ResourceError::constraint(
                schema.id_field,
                "id must not be supplied on create",
            )
            .into());
        }
        if let Some(actual) = payload.tenant_id(schema).filter(|t| *t != tenant_id) {
            return Err(ResourceError::TenantIdMismatch {
                expected: tenant_id,
                actual,
            }
            .into());
        }
        if let Some((relation, _)) = payload.relations().iter().find(|(_, refs)| !refs.is_empty()) {
            return Err(ResourceError::constraint(
                relation.as_str(),
                "associations cannot be set on create",
            )
            .into());
        }

        let mut record = Record::new();
        for field in schema.fields {
            record.set(field.name, payload.value(field.name).clone());
        }
        record.set(schema.id_field, FieldValue::Uuid(Uuid::new_v4()));
        record.set(schema.tenant_field, FieldValue::Uuid(tenant_id));
        for relation in schema.relations {
            record.set_references(relation.name, Vec::new());
        }

        let mut tx = self.repository.begin().await?;
        let outcome = tx.save(schema, record).await.map_err(Error::from);
        finish(tx, "create", resource, outcome).await
    }

    /// Replace the scalar fields of an existing row
    ///
    /// Identity and tenant are kept; association collections are only changed
    /// through the relation operations.
    pub async fn update(
        &self,
        resource: &str,
        tenant_id: Uuid,
        id: Uuid,
        payload: Record,
    ) -> TenancyResult<Record> {
        tracing::debug!(operation = "update", resource = %resource, tenant = %tenant_id, id = %id, "Updating resource");
        let schema = self.entry(resource)?.schema;

        self.validate(schema, &payload, Operation::Update)?;
        if payload.id(schema).is_some_and(|payload_id| payload_id != id) {
            return Err(ResourceError::constraint(
                schema.id_field,
                "id in payload does not match the addressed resource",
            )
            .into());
        }
        if let Some(actual) = payload.tenant_id(schema).filter(|t| *t != tenant_id) {
            return Err(ResourceError::TenantIdMismatch {
                expected: tenant_id,
                actual,
            }
            .into());
        }

        let mut tx = self.repository.begin().await?;
        let outcome: TenancyResult<Record> = async {
            let mut existing = load_scoped(tx.as_mut(), schema, tenant_id, id).await?;
            existing.copy_fields_from(&payload, schema, &[schema.id_field, schema.tenant_field]);
            Ok(tx.save(schema, existing).await?)
        }
        .await;
        finish(tx, "update", resource, outcome).await
    }

    /// Delete one row under a tenant
    pub async fn delete(&self, resource: &str, tenant_id: Uuid, id: Uuid) -> TenancyResult<()> {
        tracing::debug!(operation = "delete", resource = %resource, tenant = %tenant_id, id = %id, "Deleting resource");
        let schema = self.entry(resource)?.schema;

        let mut tx = self.repository.begin().await?;
        let outcome = match tx.delete(schema, &scoped_id(schema, tenant_id, id)).await {
            Ok(0) => Err(not_found(schema.name, vec![id])),
            Ok(1) => Ok(()),
            Ok(n) => Err(unexpected(schema, n as usize)),
            Err(err) => Err(err.into()),
        };
        finish(tx, "delete", resource, outcome).await
    }

    /// List the rows linked to an owner through a relation
    pub async fn get_related(
        &self,
        resource: &str,
        tenant_id: Uuid,
        id: Uuid,
        relation: &str,
        filter: Option<&FilterExpr>,
        page: &PageRequest,
    ) -> TenancyResult<Page<Record>> {
        tracing::debug!(
            operation = "get_related",
            resource = %resource,
            relation = %relation,
            tenant = %tenant_id,
            id = %id,
            "Listing related resources"
        );
        let entry = self.entry(resource)?;
        let descriptor = entry.catalog.resolve(relation)?;
        let related = self.entry(descriptor.related)?.schema;
        let filter = compile(filter, related)?;
        let sort = page.ordering(related)?;

        let mut tx = self.repository.begin().await?;
        let outcome: TenancyResult<Page<Record>> = async {
            let owner = load_scoped(tx.as_mut(), entry.schema, tenant_id, id).await?;
            let linked: Vec<FieldValue> = owner
                .references(relation)
                .iter()
                .filter(|r| r.resource_type == related.name)
                .map(|r| FieldValue::Uuid(r.id))
                .collect();
            if linked.is_empty() {
                let limit = page.limit(&self.pagination);
                return Ok(Page {
                    data: Vec::new(),
                    pagination: PaginationMeta::new(page.page(), limit, 0),
                });
            }
            let predicate = Predicate::all([
                Some(Predicate::is_in(related.id_field, linked)),
                Some(tenant_scope(related, tenant_id)),
                filter,
            ]);
            self.query_page(tx.as_mut(), related, predicate, sort, page)
                .await
        }
        .await;
        finish(tx, "get_related", resource, outcome).await
    }

    /// Link existing rows of the related resource to an owner
    ///
    /// Every id must name a row of the same tenant. Ids already linked are
    /// left alone, so repeating a call changes nothing.
    pub async fn add_related(
        &self,
        resource: &str,
        tenant_id: Uuid,
        id: Uuid,
        relation: &str,
        ids: &[Uuid],
    ) -> TenancyResult<Record> {
        tracing::debug!(
            operation = "add_related",
            resource = %resource,
            relation = %relation,
            tenant = %tenant_id,
            id = %id,
            count = ids.len(),
            "Linking related resources"
        );
        let entry = self.entry(resource)?;
        let descriptor = entry.catalog.resolve(relation)?;
        let related = self.entry(descriptor.related)?.schema;
        let ids = collapse(ids);
        let references = ids
            .iter()
            .map(|related_id| entry.catalog.entity_reference(relation, *related_id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.repository.begin().await?;
        let outcome: TenancyResult<Record> = async {
            let mut owner = load_scoped(tx.as_mut(), entry.schema, tenant_id, id).await?;

            if !ids.is_empty() {
                let predicate = Predicate::is_in(
                    related.id_field,
                    ids.iter().map(|i| FieldValue::Uuid(*i)).collect(),
                )
                .and(tenant_scope(related, tenant_id));
                let found: HashSet<Uuid> = tx
                    .find(related, &Query::filtered(predicate))
                    .await?
                    .iter()
                    .filter_map(|row| row.id(related))
                    .collect();
                let missing: Vec<Uuid> = ids.iter().copied().filter(|i| !found.contains(i)).collect();
                if !missing.is_empty() {
                    return Err(not_found(related.name, missing));
                }
            }

            let linked = owner.references_mut(relation);
            for reference in references {
                if !linked.contains(&reference) {
                    linked.push(reference);
                }
            }
            Ok(tx.save(entry.schema, owner).await?)
        }
        .await;
        finish(tx, "add_related", resource, outcome).await
    }

    /// Unlink rows of the related resource from an owner
    ///
    /// Fails without changing anything when some id is not currently linked;
    /// the error lists exactly those ids.
    pub async fn delete_related(
        &self,
        resource: &str,
        tenant_id: Uuid,
        id: Uuid,
        relation: &str,
        ids: &[Uuid],
    ) -> TenancyResult<Record> {
        tracing::debug!(
            operation = "delete_related",
            resource = %resource,
            relation = %relation,
            tenant = %tenant_id,
            id = %id,
            count = ids.len(),
            "Unlinking related resources"
        );
        let entry = self.entry(resource)?;
        let descriptor = entry.catalog.resolve(relation)?;
        let related = descriptor.related;
        let ids = collapse(ids);

        let mut tx = self.repository.begin().await?;
        let outcome: TenancyResult<Record> = async {
            let mut owner = load_scoped(tx.as_mut(), entry.schema, tenant_id, id).await?;

            let linked: HashSet<Uuid> = owner
                .references(relation)
                .iter()
                .filter(|r| r.resource_type == related)
                .map(|r| r.id)
                .collect();
            let missing: Vec<Uuid> = ids.iter().copied().filter(|i| !linked.contains(i)).collect();
            if !missing.is_empty() {
                return Err(not_found(related, missing));
            }

            owner
                .references_mut(relation)
                .retain(|r| r.resource_type != related || !ids.contains(&r.id));
            Ok(tx.save(entry.schema, owner).await?)
        }
        .await;
        finish(tx, "delete_related", resource, outcome).await
    }
}

impl std::fmt::Debug for ResourceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceEngine")
            .field("registry", &self.registry)
            .field("pagination", &self.pagination)
            .finish_non_exhaustive()
    }
}
