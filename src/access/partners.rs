//! Partner records and the partners field
//!
//! The CMS stores a fundable work's partners either as a native list or as
//! a JSON-encoded string. `PartnersField` captures both at the boundary and
//! is converted to `Vec<Partner>` once; nothing downstream looks at the raw
//! shape again.

use crate::ident::{normalize_id, Field, IdNormalizer};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Fields consulted, in order, for a partner's user identifier.
pub const MEMBER_ID_FIELDS: &[&str] = &["userID", "userId", "user_id", "User", "user", "modalUserObj"];

#[derive(Debug, Error)]
pub enum PartnersError {
    #[error("malformed partners payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("partners field has unexpected shape: {0}")]
    UnexpectedShape(&'static str),
}

/// The partners field as received.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PartnersField {
    Parsed(Vec<Value>),
    Raw(String),
}

impl PartnersField {
    /// Classify a JSON value. Null or absent values carry no partners.
    pub fn from_value(value: &Value) -> Result<Option<Self>, PartnersError> {
        match value {
            Value::Null => Ok(None),
            Value::Array(items) => Ok(Some(Self::Parsed(items.clone()))),
            Value::String(s) => Ok(Some(Self::Raw(s.clone()))),
            Value::Bool(_) => Err(PartnersError::UnexpectedShape("boolean")),
            Value::Number(_) => Err(PartnersError::UnexpectedShape("number")),
            Value::Object(_) => Err(PartnersError::UnexpectedShape("object")),
        }
    }

    /// Resolve into partner records, parsing the raw form if needed.
    pub fn into_partners(self) -> Result<Vec<Partner>, PartnersError> {
        let items = match self {
            Self::Parsed(items) => items,
            Self::Raw(text) if text.trim().is_empty() => Vec::new(),
            Self::Raw(text) => match serde_json::from_str::<Value>(&text)? {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                _ => return Err(PartnersError::UnexpectedShape("non-array JSON")),
            },
        };
        Ok(items.iter().filter_map(Partner::from_value).collect())
    }
}

/// A participant on a fundable work.
#[derive(Debug, Clone, PartialEq)]
pub struct Partner {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub is_internal: bool,
    /// The linked user reference, if any (`User` or `user`)
    pub user: Option<Value>,
    fields: Map<String, Value>,
}

impl Partner {
    /// Build a partner from a JSON object. Non-objects are not partners.
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?.clone();
        let user = ["User", "user"]
            .iter()
            .filter_map(|k| fields.get(*k))
            .find(|v| v.is_object())
            .cloned();
        Some(Self {
            name: first_text(&fields, &["name", "fullName", "partnerName"]),
            organization: first_text(&fields, &["orgName", "organization", "organisation"]),
            is_internal: fields.get("isInternal").map(is_true_like).unwrap_or(false),
            user,
            fields,
        })
    }

    /// Parse a partners field straight from a JSON value.
    pub fn parse_field(value: &Value) -> Result<Vec<Partner>, PartnersError> {
        match PartnersField::from_value(value)? {
            Some(field) => field.into_partners(),
            None => Ok(Vec::new()),
        }
    }

    /// The linked user's identifier, trying each member id field in turn.
    pub fn member_id(&self) -> Option<String> {
        MEMBER_ID_FIELDS
            .iter()
            .filter_map(|k| self.fields.get(*k))
            .find_map(normalize_id)
    }

    /// Normalized ids of the linked user's departments.
    ///
    /// Each department entry contributes its `id` and `documentId` separately,
    /// since either may be what the caller holds.
    pub fn department_ids(&self) -> Vec<String> {
        let Some(user) = self.user.as_ref().and_then(Value::as_object) else {
            return Vec::new();
        };
        let by_field = |field: &'static str| IdNormalizer::empty().with_candidate(Field(field));
        let (by_id, by_document) = (by_field("id"), by_field("documentId"));

        let entries: Vec<&Value> = ["departments", "department"]
            .iter()
            .filter_map(|k| user.get(*k))
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                Value::Object(_) => vec![v],
                _ => Vec::new(),
            })
            .collect();

        let mut ids = Vec::new();
        for entry in entries {
            for id in [by_id.normalize(entry), by_document.normalize(entry)].into_iter().flatten() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// Raw access to the partner's fields.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

fn first_text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| fields.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// `true`, `1` and `"1"` mark a partner as internal. Anything else does not.
pub fn is_true_like(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => s.trim() == "1",
        _ => false,
    }
}
