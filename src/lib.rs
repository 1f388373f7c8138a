//! Portfolio: client-side data layer for a research-portfolio CMS
//!
//! Records for research projects, funds, conferences, publications and
//! books live in a headless CMS behind a paginated GraphQL API. This crate
//! drains those paged queries into complete collections and decides which
//! records a logged-in user may see.
//!
//! # Core Concepts
//!
//! - **Identifiers**: heterogeneous id shapes reduced to one canonical string
//! - **Partners**: participants on a fundable work; internal partners link a
//!   record to users and their departments
//! - **Sessions**: a paged query drained page by page into one collection,
//!   with cancellation and restart on variable change
//!
//! # Example
//!
//! ```
//! use portfolio::{normalize_id, is_visible_to_department};
//! use serde_json::json;
//!
//! assert_eq!(normalize_id(&json!({"documentId": "abc"})), Some("abc".to_string()));
//!
//! let record = json!({
//!     "partners": [{"isInternal": true, "User": {"departments": [{"documentId": "D1"}]}}]
//! });
//! assert!(is_visible_to_department(&record, Some("D1")));
//! ```

pub mod access;
pub mod catalog;
pub mod config;
pub mod ident;
pub mod paging;
pub mod remote;

pub use access::{
    extract_internal_member_ids, filter_visible, is_visible_to_department, Partner, PartnersError,
    PartnersField, RelationFilter, Role, Viewer,
};
pub use catalog::Collection;
pub use config::{ConfigError, PortfolioConfig};
pub use ident::{default_normalizer, normalize_id, IdNormalizer};
pub use paging::{
    AggregateError, Aggregator, FetchStatus, PageOutcome, PagedSession, QueryVariables,
    SessionHandle, Snapshot, DEFAULT_PAGE_SIZE,
};
pub use remote::{
    CredentialProvider, EnvCredential, FetchError, GraphqlClient, MockExecutor, Page,
    QueryExecutor, StaticCredential,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
