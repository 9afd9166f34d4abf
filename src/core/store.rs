//! Repository traits: the transactional store the engine runs against
//!
//! The engine never talks to a database directly. It opens a
//! [`Transaction`] from a [`Repository`], issues queries, saves and deletes
//! through it, and commits or rolls back exactly once.

use crate::core::error::StorageResult;
use crate::core::query::Sort;
use crate::core::record::Record;
use crate::core::resource::ResourceSchema;
use crate::filter::Predicate;
use async_trait::async_trait;

/// A single-table query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Rows must satisfy this predicate; `None` selects every row
    pub predicate: Option<Predicate>,
    /// Ordering keys, applied in order
    pub sort: Vec<Sort>,
    /// Rows to skip
    pub offset: usize,
    /// Maximum rows to return
    pub limit: Option<usize>,
}

impl Query {
    pub fn filtered(predicate: Predicate) -> Self {
        Self {
            predicate: Some(predicate),
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort: Vec<Sort>) -> Self {
        self.sort = sort;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A transactional store of resource records
///
/// Implementations map each [`ResourceSchema`] onto their own layout: one
/// identity column, one tenant column and a join structure per owning
/// many-to-many relation.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> StorageResult<Box<dyn Transaction>>;
}

/// An open transaction
///
/// Nothing done through a transaction is visible to others until
/// [`commit`](Transaction::commit); [`rollback`](Transaction::rollback)
/// discards everything. Dropping an uncommitted transaction rolls it back.
#[async_trait]
pub trait Transaction: Send {
    /// Rows of `schema` matching the query, ordered and paginated
    async fn find(&mut self, schema: &ResourceSchema, query: &Query) -> StorageResult<Vec<Record>>;

    /// Number of rows matching the predicate
    async fn count(
        &mut self,
        schema: &ResourceSchema,
        predicate: Option<&Predicate>,
    ) -> StorageResult<usize>;

    /// Insert or replace a row by identity, including its association collections
    async fn save(&mut self, schema: &ResourceSchema, record: Record) -> StorageResult<Record>;

    /// Delete matching rows, returning how many were affected
    async fn delete(&mut self, schema: &ResourceSchema, predicate: &Predicate) -> StorageResult<u64>;

    async fn commit(self: Box<Self>) -> StorageResult<()>;

    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}
