//! End-to-end behaviour of the paged aggregator against scripted executors.

mod common;

use common::{page, GatedExecutor, HookExecutor};
use portfolio::paging::{AggregateError, Aggregator, FetchStatus, PagedSession, SessionHandle};
use portfolio::{FetchError, MockExecutor, QueryVariables};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn pages_requested(calls: &[QueryVariables]) -> Vec<usize> {
    calls.iter().map(|v| v.pagination.page).collect()
}

// === Scenario: 1000 + 1000 + 437 records at page size 1000 ===
#[tokio::test]
async fn three_pages_are_drained_into_one_collection() {
    let mock = Arc::new(MockExecutor::new().with_sized_pages("projects", &[1000, 1000, 437]));
    let aggregator = Aggregator::new(mock.clone(), "query Projects", QueryVariables::new(), 1000);

    let snapshot = aggregator.run().await.unwrap();

    assert_eq!(mock.call_count(), 3);
    assert_eq!(pages_requested(&mock.calls()), vec![1, 2, 3]);
    assert_eq!(snapshot.status, FetchStatus::Complete);
    assert_eq!(snapshot.records("projects").len(), 2437);
    assert_eq!(snapshot.records("projects")[1000]["documentId"], "doc-1000");
}

// === Scenario: a full first page forces a second request ===
#[tokio::test]
async fn saturated_page_then_empty_page_completes() {
    let mock = Arc::new(
        MockExecutor::new()
            .with_sized_pages("funds", &[1000])
            .with_page(page("funds", vec![])),
    );
    let aggregator = Aggregator::new(mock.clone(), "query Funds", QueryVariables::new(), 1000);

    let snapshot = aggregator.run().await.unwrap();

    assert_eq!(pages_requested(&mock.calls()), vec![1, 2]);
    assert_eq!(snapshot.status, FetchStatus::Complete);
    assert_eq!(snapshot.records("funds").len(), 1000);
}

#[tokio::test]
async fn every_request_keeps_filters_and_sort() {
    let vars = QueryVariables::new()
        .with_sort(["startDate:desc"])
        .with_filters(json!({"status": {"eq": "active"}}));
    let mock = Arc::new(MockExecutor::new().with_sized_pages("projects", &[2, 2, 0]));
    let aggregator = Aggregator::new(mock.clone(), "query Projects", vars.clone(), 2);

    aggregator.run().await.unwrap();

    for (i, call) in mock.calls().iter().enumerate() {
        assert!(call.same_query(&vars));
        assert_eq!(call.pagination.page, i + 1);
        assert_eq!(call.pagination.page_size, 2);
    }
}

#[tokio::test]
async fn unpaged_fields_pass_through_from_latest_page() {
    let mut first = page("projects", vec![json!({"id": 1}), json!({"id": 2})]);
    first.insert("projects_connection".into(), json!({"pageInfo": {"page": 1}}));
    let mut second = page("projects", vec![json!({"id": 3})]);
    second.insert("projects_connection".into(), json!({"pageInfo": {"page": 2}}));
    let mock = Arc::new(MockExecutor::new().with_page(first).with_page(second));
    let aggregator = Aggregator::new(mock, "query Projects", QueryVariables::new(), 2);

    let snapshot = aggregator.run().await.unwrap();

    assert_eq!(snapshot.records("projects").len(), 3);
    assert_eq!(snapshot.collection["projects_connection"]["pageInfo"]["page"], 2);
}

#[tokio::test]
async fn failure_stops_paging_and_keeps_earlier_pages() {
    let mock = Arc::new(
        MockExecutor::new()
            .with_sized_pages("books", &[10])
            .with_failure(FetchError::GraphQl(vec!["Forbidden access".into()]))
            .with_sized_pages("books", &[10]),
    );
    let aggregator = Aggregator::new(mock.clone(), "query Books", QueryVariables::new(), 10);

    let err = aggregator.run().await.unwrap_err();

    assert!(matches!(err, AggregateError::Fetch(FetchError::GraphQl(_))));
    assert_eq!(mock.call_count(), 2);
    let snapshot = aggregator.handle().snapshot();
    assert_eq!(snapshot.status, FetchStatus::Errored);
    assert_eq!(snapshot.records("books").len(), 10);
    assert!(snapshot.error.is_some());
}

// === Scenario: cancel while page two is in flight ===
#[tokio::test]
async fn cancelled_in_flight_page_is_discarded() {
    let gated = Arc::new(GatedExecutor::new(
        MockExecutor::new().with_sized_pages("projects", &[1000, 1000, 5]),
        2,
    ));
    let aggregator = Aggregator::new(gated.clone(), "query Projects", QueryVariables::new(), 1000);
    let handle = aggregator.handle();

    let task = tokio::spawn(async move { aggregator.run().await });
    gated.reached.notified().await;

    let before = handle.snapshot();
    assert_eq!(before.records("projects").len(), 1000);
    handle.cancel();
    gated.release.notify_one();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(AggregateError::Cancelled)));
    let after = handle.snapshot();
    assert_eq!(after.collection, before.collection);
    assert!(after.cancelled);
    // Page 2 resolved, but no page 3 was ever requested
    assert_eq!(gated.call_count(), 2);
}

// === Scenario: filters change while page two is in flight ===
#[tokio::test]
async fn variable_change_restarts_the_running_loop() {
    let old_vars = QueryVariables::new().with_filters(json!({"year": {"eq": 2023}}));
    let new_vars = QueryVariables::new().with_filters(json!({"year": {"eq": 2024}}));

    let handle = SessionHandle::new(PagedSession::new(old_vars, 2));
    let restarter = handle.clone();
    let replacement = new_vars.clone();
    let executor = Arc::new(HookExecutor::new(
        MockExecutor::new()
            .with_sized_pages("projects", &[2])
            .with_page(page("projects", vec![json!({"id": "stale-1"}), json!({"id": "stale-2"})]))
            .with_page(page("projects", vec![json!({"id": "fresh"})])),
        2,
        move || {
            restarter.set_variables(replacement.clone());
        },
    ));
    let aggregator = Aggregator::with_handle(executor.clone(), "query Projects", handle.clone());

    let snapshot = aggregator.run().await.unwrap();

    let records = snapshot.records("projects");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], "fresh");

    let calls = executor.calls();
    assert_eq!(pages_requested(&calls), vec![1, 2, 1]);
    assert_eq!(calls[2].filters, new_vars.filters);
}

#[tokio::test]
async fn subscribers_follow_the_fetch_loop() {
    let mock = Arc::new(MockExecutor::new().with_sized_pages("conferences", &[3, 3, 1]));
    let aggregator = Aggregator::new(mock, "query Conferences", QueryVariables::new(), 3);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    aggregator
        .handle()
        .subscribe(move |s| sink.lock().unwrap().push(s.records("conferences").len()));

    aggregator.run().await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![3, 6, 7]);
}

// === Scenario: a second driver joins while page one is in flight ===
#[tokio::test]
async fn second_driver_reports_busy_not_cancelled() {
    let gated = Arc::new(GatedExecutor::new(
        MockExecutor::new().with_sized_pages("projects", &[2, 1]),
        1,
    ));
    let handle = SessionHandle::new(PagedSession::new(QueryVariables::new(), 2));
    let first = Aggregator::with_handle(gated.clone(), "query Projects", handle.clone());
    let second = Aggregator::with_handle(gated.clone(), "query Projects", handle.clone());

    let task = tokio::spawn(async move { first.run().await });
    gated.reached.notified().await;

    assert!(matches!(second.run().await, Err(AggregateError::Busy)));
    assert!(!handle.snapshot().cancelled);

    gated.release.notify_one();
    let snapshot = task.await.unwrap().unwrap();
    assert_eq!(snapshot.records("projects").len(), 3);
    assert_eq!(gated.call_count(), 2);
}
