//! Record access filtering
//!
//! Partner parsing, department-based visibility through partner
//! relations, and role-based viewer scopes.

mod filter;
mod partners;
mod scope;

pub use filter::{
    extract_internal_member_ids, internal_member_ids, is_visible_to_department, RelationFilter,
    DEFAULT_RELATIONS,
};
pub use partners::{is_true_like, Partner, PartnersError, PartnersField, MEMBER_ID_FIELDS};
pub use scope::{filter_visible, Role, Viewer};
