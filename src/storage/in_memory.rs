//! In-memory repository for testing and development
//!
//! Transactions are serialized: `begin` takes an owned lock on the tables.
//! A table is copied the first time a transaction writes to it; `commit`
//! writes those copies back and `rollback` (or a drop) throws them away.

use crate::core::error::{StorageError, StorageResult};
use crate::core::field::FieldValue;
use crate::core::query::{Sort, SortDirection};
use crate::core::record::Record;
use crate::core::resource::ResourceSchema;
use crate::core::store::{Query, Repository, Transaction};
use crate::filter::{CompareOp, Predicate};
use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

const BACKEND: &str = "in-memory";

type Tables = HashMap<String, IndexMap<Uuid, Record>>;

/// In-memory repository implementation
///
/// Cloning is cheap and clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    /// Create a new, empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed rows of a resource, in insertion order
    pub async fn rows(&self, resource: &str) -> Vec<Record> {
        let tables = self.tables.lock().await;
        tables
            .get(resource)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Committed row of a resource by identity, whatever its tenant
    pub async fn row(&self, resource: &str, id: Uuid) -> Option<Record> {
        let tables = self.tables.lock().await;
        tables.get(resource).and_then(|table| table.get(&id)).cloned()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn begin(&self) -> StorageResult<Box<dyn Transaction>> {
        let guard = self.tables.clone().lock_owned().await;
        Ok(Box::new(InMemoryTransaction {
            guard,
            touched: Tables::new(),
        }))
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    /// Working copies of the tables written so far
    touched: Tables,
}

impl InMemoryTransaction {
    fn table(&self, name: &str) -> Option<&IndexMap<Uuid, Record>> {
        self.touched.get(name).or_else(|| self.guard.get(name))
    }

    fn table_mut(&mut self, name: &str) -> &mut IndexMap<Uuid, Record> {
        if !self.touched.contains_key(name) {
            let copy = self.guard.get(name).cloned().unwrap_or_default();
            self.touched.insert(name.to_string(), copy);
        }
        self.touched.entry(name.to_string()).or_default()
    }

    fn matching<'t>(
        &'t self,
        schema: &ResourceSchema,
        matcher: Option<&'t Matcher<'_>>,
    ) -> impl Iterator<Item = &'t Record> {
        self.table(schema.name)
            .into_iter()
            .flat_map(IndexMap::values)
            .filter(move |record| matcher.is_none_or(|m| m.test(record)))
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn find(&mut self, schema: &ResourceSchema, query: &Query) -> StorageResult<Vec<Record>> {
        let matcher = query.predicate.as_ref().map(Matcher::compile).transpose()?;
        let mut rows: Vec<&Record> = self.matching(schema, matcher.as_ref()).collect();
        rows.sort_by(|a, b| compare_rows(a, b, &query.sort));

        let rows = rows.into_iter().skip(query.offset).cloned();
        Ok(match query.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        })
    }

    async fn count(
        &mut self,
        schema: &ResourceSchema,
        predicate: Option<&Predicate>,
    ) -> StorageResult<usize> {
        let matcher = predicate.map(Matcher::compile).transpose()?;
        Ok(self.matching(schema, matcher.as_ref()).count())
    }

    async fn save(&mut self, schema: &ResourceSchema, record: Record) -> StorageResult<Record> {
        let id = record.id(schema).ok_or_else(|| StorageError::Query {
            backend: BACKEND.to_string(),
            message: format!("cannot save a {} without identity", schema.name),
        })?;
        self.table_mut(schema.name).insert(id, record.clone());
        Ok(record)
    }

    async fn delete(&mut self, schema: &ResourceSchema, predicate: &Predicate) -> StorageResult<u64> {
        let matcher = Matcher::compile(predicate)?;
        if self.table(schema.name).is_none_or(|table| !table.values().any(|r| matcher.test(r))) {
            return Ok(0);
        }
        let table = self.table_mut(schema.name);
        let before = table.len();
        table.retain(|_, record| !matcher.test(record));
        Ok((before - table.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let InMemoryTransaction { mut guard, touched } = *self;
        guard.extend(touched);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

/// Orders two values, nulls last
fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

fn compare_rows(a: &Record, b: &Record, sort: &[Sort]) -> Ordering {
    sort.iter()
        .map(|key| {
            let ordering = compare_values(a.get(&key.field), b.get(&key.field));
            match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// A predicate prepared for evaluation, with LIKE patterns compiled
enum Matcher<'p> {
    Compare {
        field: &'p str,
        op: CompareOp,
        value: &'p FieldValue,
    },
    CompareFields {
        left: &'p str,
        op: CompareOp,
        right: &'p str,
    },
    Like {
        field: &'p str,
        regex: Regex,
    },
    In {
        field: &'p str,
        values: &'p [FieldValue],
    },
    Between {
        field: &'p str,
        low: &'p FieldValue,
        high: &'p FieldValue,
    },
    And(Vec<Matcher<'p>>),
    Or(Vec<Matcher<'p>>),
    Not(Box<Matcher<'p>>),
}

impl<'p> Matcher<'p> {
    fn compile(predicate: &'p Predicate) -> StorageResult<Self> {
        Ok(match predicate {
            Predicate::Compare { field, op, value } => Matcher::Compare { field, op: *op, value },
            Predicate::CompareFields { left, op, right } => Matcher::CompareFields {
                left,
                op: *op,
                right,
            },
            Predicate::Like { field, pattern } => Matcher::Like {
                field,
                regex: like_to_regex(pattern)?,
            },
            Predicate::In { field, values } => Matcher::In { field, values },
            Predicate::Between { field, low, high } => Matcher::Between { field, low, high },
            Predicate::And(parts) => Matcher::And(Self::compile_all(parts)?),
            Predicate::Or(parts) => Matcher::Or(Self::compile_all(parts)?),
            Predicate::Not(inner) => Matcher::Not(Box::new(Matcher::compile(inner)?)),
        })
    }

    fn compile_all(parts: &'p [Predicate]) -> StorageResult<Vec<Self>> {
        parts.iter().map(Matcher::compile).collect()
    }

    fn test(&self, record: &Record) -> bool {
        let value = |field: &str| record.value(field);
        match self {
            Matcher::Compare { field, op, value: expected } => {
                compare(value(field), *op, expected)
            }
            Matcher::CompareFields { left, op, right } => {
                let (left, right) = (value(left), value(right));
                !left.is_null() && !right.is_null() && compare(left, *op, right)
            }
            Matcher::Like { field, regex } => value(field)
                .to_text()
                .is_some_and(|text| regex.is_match(&text)),
            Matcher::In { field, values } => {
                let actual = value(field);
                values.iter().any(|v| actual.matches(v))
            }
            Matcher::Between { field, low, high } => {
                let actual = value(field);
                matches!(actual.compare(low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(actual.compare(high), Some(Ordering::Less | Ordering::Equal))
            }
            Matcher::And(parts) => parts.iter().all(|m| m.test(record)),
            Matcher::Or(parts) => parts.iter().any(|m| m.test(record)),
            Matcher::Not(inner) => !inner.test(record),
        }
    }
}

/// Comparison with null semantics: `= null` and `<> null` test for null,
/// every other comparison involving null is false
fn compare(actual: &FieldValue, op: CompareOp, expected: &FieldValue) -> bool {
    match op {
        CompareOp::Eq => actual.matches(expected),
        CompareOp::Ne if expected.is_null() => !actual.is_null(),
        CompareOp::Ne => !actual.is_null() && !actual.matches(expected),
        op => match actual.compare(expected) {
            Some(ordering) => match op {
                CompareOp::Ge => ordering.is_ge(),
                CompareOp::Gt => ordering.is_gt(),
                CompareOp::Le => ordering.is_le(),
                _ => ordering.is_lt(),
            },
            None => false,
        },
    }
}

/// Translate a LIKE pattern (`%` any run, `_` one character) into a regex
fn like_to_regex(pattern: &str) -> StorageResult<Regex> {
    let mut source = String::from("(?s)^");
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            c => source.push_str(&regex::escape(&c.to_string())),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|e| StorageError::Query {
        backend: BACKEND.to_string(),
        message: e.to_string(),
    })
}
