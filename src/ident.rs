//! Identifier normalization
//!
//! The CMS hands back identifiers in many shapes: plain numbers, numeric
//! strings, document ids, objects exposing the id under one of several
//! field names, and arrays of any of these. Everything is reduced to a
//! canonical string id, or `None` when nothing resolves.

use serde_json::Value;
use std::sync::OnceLock;

/// Object fields consulted for an identifier, highest priority first.
pub const ID_FIELDS: &[&str] = &[
    "documentId",
    "documentID",
    "document_id",
    "id",
    "userID",
    "userId",
    "user_id",
];

/// A candidate extractor for object-shaped identifiers.
///
/// Given an object, a candidate returns the nested value it believes holds
/// the identifier. The normalizer recurses into whatever it returns.
pub trait IdCandidate: Send + Sync {
    fn extract<'a>(&self, object: &'a serde_json::Map<String, Value>) -> Option<&'a Value>;
}

/// Looks the identifier up under a single field name.
pub struct Field(pub &'static str);

impl IdCandidate for Field {
    fn extract<'a>(&self, object: &'a serde_json::Map<String, Value>) -> Option<&'a Value> {
        object.get(self.0).filter(|v| !v.is_null())
    }
}

/// Unwraps an envelope such as `{ "data": { ... } }` or `{ "attributes": { ... } }`.
pub struct Envelope(pub &'static str);

impl IdCandidate for Envelope {
    fn extract<'a>(&self, object: &'a serde_json::Map<String, Value>) -> Option<&'a Value> {
        object.get(self.0).filter(|v| v.is_object() || v.is_array())
    }
}

/// Resolves identifiers by trying an ordered list of candidates.
pub struct IdNormalizer {
    candidates: Vec<Box<dyn IdCandidate>>,
}

impl IdNormalizer {
    /// A normalizer with no candidates; objects never resolve.
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// Append a candidate after the existing ones.
    pub fn with_candidate(mut self, candidate: impl IdCandidate + 'static) -> Self {
        self.candidates.push(Box::new(candidate));
        self
    }

    /// Normalize any JSON value into a canonical string id.
    pub fn normalize(&self, value: &Value) -> Option<String> {
        match value {
            Value::Null | Value::Bool(_) => None,
            Value::Number(n) => normalize_number(n),
            Value::String(s) => normalize_str(s),
            Value::Array(items) => items.iter().find_map(|item| self.normalize(item)),
            Value::Object(object) => self
                .candidates
                .iter()
                .filter_map(|c| c.extract(object))
                .find_map(|v| self.normalize(v)),
        }
    }
}

impl Default for IdNormalizer {
    fn default() -> Self {
        ID_FIELDS
            .iter()
            .fold(Self::empty(), |n, field| n.with_candidate(Field(*field)))
    }
}

/// The normalizer with the default field priority, built once.
pub fn default_normalizer() -> &'static IdNormalizer {
    static DEFAULT: OnceLock<IdNormalizer> = OnceLock::new();
    DEFAULT.get_or_init(IdNormalizer::default)
}

/// Normalize with the default field priority.
pub fn normalize_id(value: &Value) -> Option<String> {
    default_normalizer().normalize(value)
}

fn normalize_number(n: &serde_json::Number) -> Option<String> {
    if let Some(u) = n.as_u64() {
        return Some(u.to_string());
    }
    if let Some(i) = n.as_i64() {
        // Negative: not a numeric id, kept in its string form
        return Some(i.to_string());
    }
    n.as_f64().and_then(|f| normalize_str(&format_float(f)))
}

fn normalize_str(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && is_plain_decimal(trimmed) => Some(format_float(f)),
        _ => Some(trimmed.to_string()),
    }
}

/// Only plain decimal text is coerced; "inf", "1e3" and the like stay strings.
fn is_plain_decimal(s: &str) -> bool {
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in s.chars().enumerate() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            '+' if i == 0 => {}
            _ => return false,
        }
    }
    seen_digit
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}
