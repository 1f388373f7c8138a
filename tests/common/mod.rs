//! Shared helpers for the integration tests
//!
//! Executors with hooks into the fetch loop, and record builders shaped
//! like the CMS's project and fund payloads.

#![allow(dead_code)]

use async_trait::async_trait;
use portfolio::{FetchError, MockExecutor, Page, QueryExecutor, QueryVariables};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Holds the response for `gate_page` until `release` is notified.
pub struct GatedExecutor {
    inner: MockExecutor,
    gate_page: usize,
    pub reached: Notify,
    pub release: Notify,
}

impl GatedExecutor {
    pub fn new(inner: MockExecutor, gate_page: usize) -> Self {
        Self {
            inner,
            gate_page,
            reached: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }
}

#[async_trait]
impl QueryExecutor for GatedExecutor {
    async fn execute(&self, query: &str, variables: &QueryVariables) -> Result<Page, FetchError> {
        if variables.pagination.page == self.gate_page {
            self.reached.notify_one();
            self.release.notified().await;
        }
        self.inner.execute(query, variables).await
    }
}

/// Runs `hook` during the `at_call`-th request, before its response returns.
pub struct HookExecutor<F> {
    inner: MockExecutor,
    calls: AtomicUsize,
    at_call: usize,
    hook: F,
}

impl<F: Fn() + Send + Sync> HookExecutor<F> {
    pub fn new(inner: MockExecutor, at_call: usize, hook: F) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            at_call,
            hook,
        }
    }

    pub fn calls(&self) -> Vec<QueryVariables> {
        self.inner.calls()
    }
}

#[async_trait]
impl<F: Fn() + Send + Sync> QueryExecutor for HookExecutor<F> {
    async fn execute(&self, query: &str, variables: &QueryVariables) -> Result<Page, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.inner.execute(query, variables).await;
        if call == self.at_call {
            (self.hook)();
        }
        result
    }
}

/// An internal partner belonging to `department`.
pub fn internal_partner(user_id: u64, department: &str) -> Value {
    json!({
        "name": format!("Member {}", user_id),
        "orgName": "University",
        "isInternal": true,
        "userId": user_id,
        "User": {"id": user_id, "departments": [{"documentId": department}]}
    })
}

/// An external partner with no linked user.
pub fn external_partner(name: &str) -> Value {
    json!({"name": name, "orgName": "Industry Ltd", "isInternal": false})
}

/// A project whose partners are stored the way the CMS stores them: as a JSON string.
pub fn project(id: &str, partners: Vec<Value>) -> Value {
    json!({
        "documentId": id,
        "title": format!("Project {}", id),
        "partners": Value::Array(partners).to_string()
    })
}

/// A page holding `records` under `field`.
pub fn page(field: &str, records: Vec<Value>) -> Page {
    let mut page = Page::new();
    page.insert(field.to_string(), Value::Array(records));
    page
}
