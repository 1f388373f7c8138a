//! Relation membership filtering
//!
//! A record is visible to a department when one of its fundable works (the
//! record itself, or a record one relation hop away such as its funds) has
//! an internal partner whose user belongs to that department.

use super::partners::Partner;
use crate::ident::normalize_id;
use serde_json::Value;
use tracing::warn;

/// Relations followed one hop when looking for partners.
pub const DEFAULT_RELATIONS: &[&str] = &["funds", "fund", "projects", "project"];

/// Walks a record and its one-hop relations looking for partners.
#[derive(Debug, Clone)]
pub struct RelationFilter {
    relations: Vec<String>,
}

impl RelationFilter {
    pub fn new() -> Self {
        Self::with_relations(DEFAULT_RELATIONS.iter().copied())
    }

    pub fn with_relations<I, S>(relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            relations: relations.into_iter().map(Into::into).collect(),
        }
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    /// The record itself followed by every related record, in order.
    fn carriers<'a>(&self, record: &'a Value) -> Vec<&'a Value> {
        let mut carriers = vec![record];
        for relation in &self.relations {
            match record.get(relation.as_str()) {
                Some(Value::Array(items)) => carriers.extend(items.iter().filter(|v| v.is_object())),
                Some(v @ Value::Object(_)) => carriers.push(v),
                _ => {}
            }
        }
        carriers
    }

    /// Partners of every carrier.
    ///
    /// `None` when the record's own partners are unreadable. A related
    /// record with unreadable partners contributes nothing.
    fn partners(&self, record: &Value) -> Option<Vec<Partner>> {
        let mut partners = partners_of(record)?;
        for related in self.carriers(record).into_iter().skip(1) {
            partners.extend(partners_of(related).unwrap_or_default());
        }
        Some(partners)
    }

    /// Whether `record` is visible to `department_id`.
    ///
    /// An empty or absent department leaves the filter inactive.
    pub fn is_visible_to_department(&self, record: &Value, department_id: Option<&str>) -> bool {
        let Some(department) = department_id.and_then(|d| normalize_id(&Value::String(d.to_string()))) else {
            return true;
        };
        let Some(partners) = self.partners(record) else {
            return false;
        };
        partners
            .iter()
            .filter(|p| p.is_internal)
            .any(|p| p.department_ids().iter().any(|d| *d == department))
    }

    /// Whether `member_id` is an internal member on `record`.
    pub fn has_internal_member(&self, record: &Value, member_id: &str) -> bool {
        let Some(member) = normalize_id(&Value::String(member_id.to_string())) else {
            return false;
        };
        self.partners(record)
            .is_some_and(|partners| internal_member_ids(&partners).contains(&member))
    }
}

impl Default for RelationFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Partners stored on a single carrier's `partners` field.
fn partners_of(carrier: &Value) -> Option<Vec<Partner>> {
    let Some(raw) = carrier.get("partners") else {
        return Some(Vec::new());
    };
    match Partner::parse_field(raw) {
        Ok(partners) => Some(partners),
        Err(e) => {
            warn!(
                record = normalize_id(carrier).as_deref().unwrap_or("<unknown>"),
                error = %e,
                "unreadable partners field"
            );
            None
        }
    }
}

/// Department visibility using the default relations.
pub fn is_visible_to_department(record: &Value, department_id: Option<&str>) -> bool {
    RelationFilter::new().is_visible_to_department(record, department_id)
}

/// User ids of internal partners, deduplicated in first-seen order.
pub fn internal_member_ids(partners: &[Partner]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in partners.iter().filter(|p| p.is_internal).filter_map(Partner::member_id) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Internal member ids from a raw partners field (list or JSON string).
///
/// A malformed payload yields no members.
pub fn extract_internal_member_ids(partners: &Value) -> Vec<String> {
    match Partner::parse_field(partners) {
        Ok(parsed) => internal_member_ids(&parsed),
        Err(e) => {
            warn!(error = %e, "no members extracted from unreadable partners field");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with(partners: Value) -> Value {
        json!({"documentId": "p-1", "title": "Soil carbon", "partners": partners})
    }

    // === Scenario: internal partner in department makes the record visible ===
    #[test]
    fn visible_through_stringified_partners() {
        let partners = json!([{"isInternal": true, "User": {"departments": [{"documentId": "D1"}]}}]);
        let record = record_with(Value::String(partners.to_string()));
        assert!(is_visible_to_department(&record, Some("D1")));
        assert!(!is_visible_to_department(&record, Some("D2")));
    }

    #[test]
    fn numeric_department_ids_compare_as_strings() {
        let record = record_with(json!([{"isInternal": 1, "User": {"departments": [{"id": 7}]}}]));
        assert!(is_visible_to_department(&record, Some("7")));
        assert!(is_visible_to_department(&record, Some(" 7 ")));
    }

    #[test]
    fn missing_internal_flag_is_not_visible() {
        let record = record_with(json!([{"User": {"departments": [{"documentId": "D1"}]}}]));
        assert!(!is_visible_to_department(&record, Some("D1")));
    }

    #[test]
    fn explicit_false_is_not_visible() {
        let record = record_with(json!([{"isInternal": false, "User": {"departments": [{"documentId": "D1"}]}}]));
        assert!(!is_visible_to_department(&record, Some("D1")));
    }

    #[test]
    fn invalid_json_is_not_visible() {
        let record = record_with(json!("[{oops"));
        assert!(!is_visible_to_department(&record, Some("D1")));
    }

    #[test]
    fn missing_partners_is_not_visible() {
        let record = json!({"documentId": "p-2"});
        assert!(!is_visible_to_department(&record, Some("D1")));
    }

    #[test]
    fn empty_department_passes_everything() {
        let record = record_with(json!("[{oops"));
        assert!(is_visible_to_department(&record, Some("")));
        assert!(is_visible_to_department(&record, Some("   ")));
        assert!(is_visible_to_department(&record, None));
    }

    // === Scenario: visibility through a one-hop relation ===
    #[test]
    fn visible_through_related_fund() {
        let record = json!({
            "documentId": "pub-1",
            "funds": [
                {"documentId": "f-1", "partners": "not json"},
                {"documentId": "f-2", "partners": [
                    {"isInternal": "1", "User": {"departments": [{"id": 4, "documentId": "D4"}]}}
                ]}
            ]
        });
        assert!(is_visible_to_department(&record, Some("D4")));
        assert!(is_visible_to_department(&record, Some("4")));

        let only_projects = RelationFilter::with_relations(["projects"]);
        assert!(!only_projects.is_visible_to_department(&record, Some("D4")));
    }

    // === Scenario: broken own partners hide the record despite its funds ===
    #[test]
    fn unreadable_own_partners_hide_the_record() {
        let record = json!({
            "documentId": "p-3",
            "partners": "[{oops",
            "funds": [{"partners": [
                {"isInternal": true, "userId": 6, "User": {"departments": [{"documentId": "D1"}]}}
            ]}]
        });
        let filter = RelationFilter::new();
        assert!(!filter.is_visible_to_department(&record, Some("D1")));
        assert!(!filter.has_internal_member(&record, "6"));
        assert!(filter.is_visible_to_department(&record, None));
    }

    #[test]
    fn member_ids_deduplicated_in_order() {
        let partners = json!([
            {"isInternal": true, "userId": 5},
            {"isInternal": true, "User": {"documentId": "u-a"}},
            {"isInternal": false, "userId": 9},
            {"userId": 10},
            {"isInternal": "1", "user_id": "5"},
            {"isInternal": 1, "modalUserObj": {"id": 11}}
        ]);
        assert_eq!(extract_internal_member_ids(&partners), vec!["5", "u-a", "11"]);

        let raw = Value::String(partners.to_string());
        assert_eq!(extract_internal_member_ids(&raw), vec!["5", "u-a", "11"]);
    }

    #[test]
    fn member_ids_of_malformed_payload_are_empty() {
        assert!(extract_internal_member_ids(&json!("{{")).is_empty());
        assert!(extract_internal_member_ids(&Value::Null).is_empty());
    }

    #[test]
    fn has_internal_member_checks_relations() {
        let record = json!({
            "partners": [{"isInternal": true, "userId": 1}],
            "fund": {"partners": [{"isInternal": true, "userId": 2}]}
        });
        let filter = RelationFilter::new();
        assert!(filter.has_internal_member(&record, "1"));
        assert!(filter.has_internal_member(&record, "2"));
        assert!(!filter.has_internal_member(&record, "3"));
        assert!(!filter.has_internal_member(&record, ""));
    }
}
