//! Async fetch loop driving a paged session

use super::handle::SessionHandle;
use super::session::{FetchStatus, PagedSession, Snapshot};
use super::variables::QueryVariables;
use crate::remote::{FetchError, QueryExecutor};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("aggregation cancelled")]
    Cancelled,
    #[error("another driver has a page in flight for this session")]
    Busy,
}

/// Drains a paged query into one collection.
///
/// Pages are fetched one at a time through the injected executor and
/// applied to the shared session. The loop follows restarts: if the
/// variables change while a page is in flight, that page is dropped and
/// fetching resumes from page 1 of the new query.
pub struct Aggregator {
    executor: Arc<dyn QueryExecutor>,
    query: String,
    handle: SessionHandle,
}

impl Aggregator {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        query: impl Into<String>,
        variables: QueryVariables,
        page_size: usize,
    ) -> Self {
        Self::with_handle(
            executor,
            query,
            SessionHandle::new(PagedSession::new(variables, page_size)),
        )
    }

    /// Drive an existing session.
    pub fn with_handle(executor: Arc<dyn QueryExecutor>, query: impl Into<String>, handle: SessionHandle) -> Self {
        Self {
            executor,
            query: query.into(),
            handle,
        }
    }

    /// A handle for readers, subscribers and cancellation.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Fetch pages until the session completes, fails or is cancelled.
    ///
    /// On failure the partially accumulated collection stays readable
    /// through the handle. Returns `Busy` without fetching when another
    /// driver already has a page of this session in flight.
    pub async fn run(&self) -> Result<Snapshot, AggregateError> {
        while let Some(request) = self.handle.next_request() {
            debug!(page = request.ticket.page, generation = request.ticket.generation, "fetching page");
            let result = self.executor.execute(&self.query, &request.variables).await;
            self.handle.apply(request.ticket, result);
        }

        let snapshot = self.handle.snapshot();
        match (snapshot.status, snapshot.error.clone()) {
            (FetchStatus::Complete, _) => Ok(snapshot),
            (FetchStatus::Errored, Some(e)) => Err(AggregateError::Fetch(e)),
            _ if snapshot.cancelled => Err(AggregateError::Cancelled),
            _ => Err(AggregateError::Busy),
        }
    }
}
