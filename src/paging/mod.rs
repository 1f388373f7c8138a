//! Paged collection aggregation
//!
//! Drains a paginated query into a single in-memory collection. The
//! session is a plain state machine; the handle shares it with readers;
//! the aggregator runs the fetch loop against a remote executor.

mod aggregator;
mod handle;
mod session;
mod variables;

pub use aggregator::{AggregateError, Aggregator};
pub use handle::{Listener, SessionHandle, SubscriptionId};
pub use session::{
    is_saturated, FetchStatus, PageOutcome, PageRequest, PageTicket, PagedSession, Snapshot,
};
pub use variables::{Pagination, QueryVariables, DEFAULT_PAGE_SIZE};
