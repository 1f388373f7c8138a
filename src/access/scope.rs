//! Viewer scopes
//!
//! Which records a logged-in user may see depends on their role:
//! super-admins see everything, admins see their department's records,
//! faculty see the records they are an internal member of.

use super::filter::RelationFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Faculty,
    Admin,
    SuperAdmin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "faculty" => Ok(Self::Faculty),
            "admin" => Ok(Self::Admin),
            "superadmin" | "super_admin" | "super-admin" => Ok(Self::SuperAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Faculty => write!(f, "faculty"),
            Self::Admin => write!(f, "admin"),
            Self::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

/// The logged-in user, as far as record visibility is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub role: Role,
    pub user_id: Option<String>,
    pub department_id: Option<String>,
}

impl Viewer {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            user_id: None,
            department_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    /// Whether this viewer may see `record`.
    pub fn can_see(&self, record: &Value, filter: &RelationFilter) -> bool {
        match self.role {
            Role::SuperAdmin => true,
            Role::Admin => filter.is_visible_to_department(record, self.department_id.as_deref()),
            Role::Faculty => self
                .user_id
                .as_deref()
                .is_some_and(|user| filter.has_internal_member(record, user)),
        }
    }
}

/// The records `viewer` may see, in their original order.
pub fn filter_visible(records: &[Value], viewer: &Viewer, filter: &RelationFilter) -> Vec<Value> {
    records
        .iter()
        .filter(|r| viewer.can_see(r, filter))
        .cloned()
        .collect()
}
