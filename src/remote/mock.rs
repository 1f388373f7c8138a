//! Scripted executor for tests and offline runs

use super::executor::{FetchError, Page, QueryExecutor};
use crate::paging::QueryVariables;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Returns preconfigured pages in order and records every call.
///
/// Once the script is exhausted every further call returns an empty page.
#[derive(Default)]
pub struct MockExecutor {
    script: Mutex<VecDeque<Result<Page, FetchError>>>,
    calls: Mutex<Vec<QueryVariables>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful page.
    pub fn with_page(self, page: Page) -> Self {
        self.push(Ok(page));
        self
    }

    /// Queue a failure.
    pub fn with_failure(self, error: FetchError) -> Self {
        self.push(Err(error));
        self
    }

    /// Queue one page per size, each holding `size` records under `field`.
    pub fn with_sized_pages(self, field: &str, sizes: &[usize]) -> Self {
        let mut offset = 0;
        for &size in sizes {
            self.push(Ok(page_of(field, offset, size)));
            offset += size;
        }
        self
    }

    fn push(&self, result: Result<Page, FetchError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Variables of every call so far, in call order.
    pub fn calls(&self) -> Vec<QueryVariables> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute(&self, _query: &str, variables: &QueryVariables) -> Result<Page, FetchError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(variables.clone());
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(Page::new()))
    }
}

/// A page with `size` records under `field`, ids numbered from `offset`.
pub fn page_of(field: &str, offset: usize, size: usize) -> Page {
    let records: Vec<Value> = (offset..offset + size)
        .map(|i| json!({"documentId": format!("doc-{}", i), "id": i}))
        .collect();
    let mut page = Page::new();
    page.insert(field.to_string(), Value::Array(records));
    page
}
