//! Paged collection session, the aggregation state machine
//!
//! A session drains one query page by page into a single collection.
//! It performs no I/O: callers take a `PageRequest`, fetch it however they
//! like, and hand the outcome back with `apply()`. Each request carries a
//! ticket stamped with the session generation; cancelling or restarting
//! bumps the generation, so late responses are recognised and dropped.
//!
//! ```text
//! accumulating ──(page with no saturated array)──▶ complete
//!      │
//!      └──────────(fetch failure)────────────────▶ errored
//! ```

use super::variables::QueryVariables;
use crate::remote::{FetchError, Page};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Accumulating,
    Complete,
    Errored,
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accumulating => write!(f, "accumulating"),
            Self::Complete => write!(f, "complete"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// Identifies one outstanding page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub page: usize,
}

/// A page the caller should fetch next.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub ticket: PageTicket,
    pub variables: QueryVariables,
}

/// What applying a page outcome did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Page merged; at least one array was saturated, so another page follows
    More,
    /// Page merged; nothing was saturated, the collection is final
    Complete,
    /// Fetch failed; the session stopped with what it had
    Failed,
    /// The ticket belongs to a cancelled or superseded request; nothing changed
    Stale,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub session_id: Uuid,
    pub generation: u64,
    pub status: FetchStatus,
    pub collection: Page,
    pub error: Option<FetchError>,
    pub pages_fetched: usize,
    pub cancelled: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Records accumulated under `field`, empty if the field is absent or not a list.
    pub fn records(&self, field: &str) -> &[Value] {
        self.collection
            .get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug)]
pub struct PagedSession {
    id: Uuid,
    variables: QueryVariables,
    page_size: usize,
    generation: u64,
    status: FetchStatus,
    buffer: Page,
    error: Option<FetchError>,
    next_page: usize,
    in_flight: Option<PageTicket>,
    cancelled: bool,
    pages_fetched: usize,
    updated_at: Option<DateTime<Utc>>,
}

impl PagedSession {
    /// Start a session for `variables`, requesting `page_size` records per page.
    ///
    /// A page size of zero is raised to one.
    pub fn new(variables: QueryVariables, page_size: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            variables,
            page_size: page_size.max(1),
            generation: 0,
            status: FetchStatus::Accumulating,
            buffer: Page::new(),
            error: None,
            next_page: 1,
            in_flight: None,
            cancelled: false,
            pages_fetched: 0,
            updated_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn variables(&self) -> &QueryVariables {
        &self.variables
    }

    pub fn collection(&self) -> &Page {
        &self.buffer
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// The next page to fetch, if one is due.
    ///
    /// Returns `None` once the session is complete, errored or cancelled, and
    /// while a previous request is still outstanding: pages are strictly
    /// sequential.
    pub fn next_request(&mut self) -> Option<PageRequest> {
        if self.status != FetchStatus::Accumulating || self.cancelled || self.in_flight.is_some() {
            return None;
        }
        let ticket = PageTicket {
            generation: self.generation,
            page: self.next_page,
        };
        self.in_flight = Some(ticket);
        Some(PageRequest {
            ticket,
            variables: self.variables.for_page(ticket.page, self.page_size),
        })
    }

    /// Apply the outcome of the request identified by `ticket`.
    pub fn apply(&mut self, ticket: PageTicket, result: Result<Page, FetchError>) -> PageOutcome {
        if self.in_flight != Some(ticket) {
            debug!(
                session = %self.id,
                generation = self.generation,
                ticket_generation = ticket.generation,
                page = ticket.page,
                "discarding stale page response"
            );
            return PageOutcome::Stale;
        }
        self.in_flight = None;
        self.updated_at = Some(Utc::now());

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(session = %self.id, page = ticket.page, error = %e, "page fetch failed");
                self.status = FetchStatus::Errored;
                self.error = Some(e);
                return PageOutcome::Failed;
            }
        };

        let saturated = is_saturated(&page, self.page_size);
        merge_page(&mut self.buffer, page);
        self.pages_fetched += 1;

        if saturated {
            debug!(session = %self.id, page = ticket.page, "page saturated, requesting next");
            self.next_page += 1;
            PageOutcome::More
        } else {
            self.status = FetchStatus::Complete;
            info!(
                session = %self.id,
                pages = self.pages_fetched,
                fields = self.buffer.len(),
                "collection complete"
            );
            PageOutcome::Complete
        }
    }

    /// Stop issuing pages and ignore any response still in flight.
    ///
    /// The accumulated buffer is left as it is.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.cancelled = true;
    }

    /// Replace the query variables.
    ///
    /// Pagination is ignored in the comparison. When the query differs, the
    /// buffer is discarded and the session starts over from page 1.
    /// Returns whether a restart happened.
    pub fn set_variables(&mut self, variables: QueryVariables) -> bool {
        if self.variables.same_query(&variables) {
            return false;
        }
        self.variables = variables;
        self.restart();
        true
    }

    /// Start over from page 1 with the current variables.
    pub fn retry(&mut self) {
        self.restart();
    }

    fn restart(&mut self) {
        self.generation += 1;
        self.status = FetchStatus::Accumulating;
        self.buffer = Page::new();
        self.error = None;
        self.next_page = 1;
        self.in_flight = None;
        self.cancelled = false;
        self.pages_fetched = 0;
        self.updated_at = Some(Utc::now());
        debug!(session = %self.id, generation = self.generation, "session restarted");
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session_id: self.id,
            generation: self.generation,
            status: self.status,
            collection: self.buffer.clone(),
            error: self.error.clone(),
            pages_fetched: self.pages_fetched,
            cancelled: self.cancelled,
            updated_at: self.updated_at,
        }
    }
}

/// A page is saturated when any of its arrays holds exactly `page_size` items.
pub fn is_saturated(page: &Page, page_size: usize) -> bool {
    page.values()
        .filter_map(Value::as_array)
        .any(|items| items.len() == page_size)
}

/// Append arrays onto the buffer; every other field is replaced.
fn merge_page(buffer: &mut Page, page: Page) {
    for (field, value) in page {
        match (buffer.get_mut(&field), value) {
            (Some(Value::Array(existing)), Value::Array(items)) => existing.extend(items),
            (_, value) => {
                buffer.insert(field, value);
            }
        }
    }
}
