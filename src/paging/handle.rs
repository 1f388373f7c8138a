//! Shared handle over a paged session
//!
//! The handle lets a fetch loop and any number of readers share one
//! session. Readers pull with `snapshot()` or register a listener with
//! `subscribe()`; listeners are called after every change that touched
//! the session, never while the session lock is held.

use super::session::{FetchStatus, PageOutcome, PageRequest, PageTicket, PagedSession, Snapshot};
use super::variables::QueryVariables;
use crate::remote::{FetchError, Page};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback invoked with the latest snapshot.
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct HandleInner {
    session: Mutex<PagedSession>,
    listeners: DashMap<SubscriptionId, Listener>,
    next_subscription: AtomicU64,
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

impl SessionHandle {
    pub fn new(session: PagedSession) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                session: Mutex::new(session),
                listeners: DashMap::new(),
                next_subscription: AtomicU64::new(0),
            }),
        }
    }

    fn session(&self) -> MutexGuard<'_, PagedSession> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session().snapshot()
    }

    pub fn status(&self) -> FetchStatus {
        self.session().status()
    }

    pub fn subscribe(&self, listener: impl Fn(&Snapshot) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.insert(id, Arc::new(listener));
        id
    }

    /// Returns whether the listener was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.remove(&id).is_some()
    }

    pub fn next_request(&self) -> Option<PageRequest> {
        self.session().next_request()
    }

    pub fn apply(&self, ticket: PageTicket, result: Result<Page, FetchError>) -> PageOutcome {
        let outcome = self.session().apply(ticket, result);
        if outcome != PageOutcome::Stale {
            self.notify();
        }
        outcome
    }

    pub fn cancel(&self) {
        self.session().cancel();
        self.notify();
    }

    /// Replace the query variables; see [`PagedSession::set_variables`].
    pub fn set_variables(&self, variables: QueryVariables) -> bool {
        let restarted = self.session().set_variables(variables);
        if restarted {
            self.notify();
        }
        restarted
    }

    pub fn retry(&self) {
        self.session().retry();
        self.notify();
    }

    /// Deliver a snapshot to every listener. Returns whether one was taken.
    fn notify(&self) -> bool {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        if listeners.is_empty() {
            return false;
        }
        let snapshot = self.snapshot();
        for listener in listeners {
            listener(&snapshot);
        }
        true
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &*self.session())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}
