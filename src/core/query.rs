//! Page requests, ordering and paginated results

use crate::config::PaginationConfig;
use crate::core::error::FilterError;
use crate::core::resource::ResourceSchema;
use serde::{Deserialize, Serialize};

/// Pagination and ordering requested by the caller
///
/// Deserializes straight from a query string.
///
/// # Example
/// ```text
/// GET /articles?page=2&limit=10
/// GET /articles?page=1&limit=20&sort=views:desc
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PageRequest {
    /// Page number (starts at 1, 0 is treated as 1)
    pub page: usize,

    /// Number of items per page (0 means the configured default)
    pub limit: usize,

    /// Sort field and direction
    ///
    /// # Format
    /// - `field:asc` or `field` (ascending)
    /// - `field:desc` (descending)
    pub sort: Option<String>,
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit,
            sort: None,
        }
    }

    pub fn sorted_by(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get limit, falling back to the default and capped by the maximum
    pub fn limit(&self, config: &PaginationConfig) -> usize {
        let requested = if self.limit == 0 {
            config.default_limit
        } else {
            self.limit
        };
        requested.clamp(1, config.max_limit.max(1))
    }

    /// Number of rows to skip
    pub fn offset(&self, config: &PaginationConfig) -> usize {
        (self.page() - 1).saturating_mul(self.limit(config))
    }

    /// Resolve the requested ordering against a schema
    ///
    /// The identity field is always appended as a final tie-breaker so that
    /// pages are stable.
    pub fn ordering(&self, schema: &ResourceSchema) -> Result<Vec<Sort>, FilterError> {
        let mut ordering = Vec::new();
        if let Some(raw) = self.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            let sort = Sort::parse(raw)?;
            if schema.field(&sort.field).is_none() {
                return Err(FilterError::UnknownField {
                    resource: schema.name.to_string(),
                    field: sort.field,
                });
            }
            ordering.push(sort);
        }
        if ordering.iter().all(|s| s.field != schema.id_field) {
            ordering.push(Sort::asc(schema.id_field));
        }
        Ok(ordering)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One ordering key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field`, `field:asc` or `field:desc`
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        let (field, direction) = match raw.split_once(':') {
            Some((field, direction)) => (field.trim(), Some(direction.trim())),
            None => (raw.trim(), None),
        };
        if field.is_empty() {
            return Err(FilterError::invalid("sort field is empty"));
        }
        match direction {
            None => Ok(Sort::asc(field)),
            Some(d) if d.eq_ignore_ascii_case("asc") => Ok(Sort::asc(field)),
            Some(d) if d.eq_ignore_ascii_case("desc") => Ok(Sort::desc(field)),
            Some(d) => Err(FilterError::invalid(format!(
                "unknown sort direction '{}'",
                d
            ))),
        }
    }
}

/// Paginated response structure
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    /// Convert every item, keeping the pagination metadata
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            data: self.data.into_iter().map(f).collect::<Result<_, _>>()?,
            pagination: self.pagination,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}
