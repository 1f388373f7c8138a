//! Query variables in the shape the CMS expects
//!
//! `{ pagination: { page, pageSize }, sort?, filters?, ...other }`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Records requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryVariables {
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    /// Any other variables the query declares
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueryVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = sort.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// The same query, positioned at `page`.
    pub fn for_page(&self, page: usize, page_size: usize) -> Self {
        Self {
            pagination: Pagination { page, page_size },
            ..self.clone()
        }
    }

    /// Whether two variable sets describe the same query, ignoring pagination.
    pub fn same_query(&self, other: &Self) -> bool {
        self.sort == other.sort && self.filters == other.filters && self.extra == other.extra
    }
}
