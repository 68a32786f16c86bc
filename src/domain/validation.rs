//! Declarative validation for inbound project payloads.
//!
//! Each field has one row in [`PROJECT_RULES`]: a predicate over the raw JSON
//! value and the message reported when it fails. Create and update share the
//! table and differ only in whether missing fields are an error.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::project::{NewProject, ProjectPatch, ProjectPriority, ProjectStatus};

/// Field name used for errors about the payload as a whole.
pub const BODY_FIELD: &str = "body";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// One validation rule
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub check: fn(&Value) -> bool,
    pub message: &'static str,
}

impl FieldRule {
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if (self.check)(value) {
            Ok(())
        } else {
            Err(ValidationError::new(self.field, self.message))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every rule's field must be present.
    Create,
    /// Only present fields are checked.
    Update,
}

pub const MIN_NAME_LEN: usize = 3;

pub const PROJECT_RULES: &[FieldRule] = &[
    FieldRule {
        field: "name",
        check: is_valid_name,
        message: "Name must be at least 3 characters",
    },
    FieldRule {
        field: "status",
        check: is_valid_status,
        message: "Status must be one of: On Hold, Active, Completed",
    },
    FieldRule {
        field: "priority",
        check: is_valid_priority,
        message: "Priority must be one of: Low, Medium, High",
    },
    FieldRule {
        field: "budget",
        check: is_positive_number,
        message: "Budget must be a positive number",
    },
    FieldRule {
        field: "dueDate",
        check: is_iso_datetime,
        message: "Invalid due date format",
    },
];

fn is_valid_name(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|name| name.chars().count() >= MIN_NAME_LEN)
}

fn is_valid_status(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.parse::<ProjectStatus>().is_ok())
}

fn is_valid_priority(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.parse::<ProjectPriority>().is_ok())
}

fn is_positive_number(value: &Value) -> bool {
    value
        .as_f64()
        .is_some_and(|budget| budget.is_finite() && budget > 0.0)
}

fn is_iso_datetime(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok())
}

/// Run `rules` against `body` in table order and report the first failure.
pub fn validate_fields<'a>(
    rules: &[FieldRule],
    body: &'a Value,
    mode: ValidationMode,
) -> Result<&'a Map<String, Value>, ValidationError> {
    let fields = body
        .as_object()
        .ok_or_else(|| ValidationError::new(BODY_FIELD, "Request body must be a JSON object"))?;

    for rule in rules {
        match (fields.get(rule.field), mode) {
            (Some(value), _) => rule.validate(value)?,
            (None, ValidationMode::Create) => {
                return Err(ValidationError::new(
                    rule.field,
                    format!("{} is required", rule.field),
                ));
            }
            (None, ValidationMode::Update) => {}
        }
    }
    Ok(fields)
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ValidationError> {
    serde_json::from_value(body).map_err(|e| ValidationError::new(BODY_FIELD, e.to_string()))
}

/// Validate a create payload. Any `id` in the body is ignored.
pub fn parse_new_project(body: Value) -> Result<NewProject, ValidationError> {
    validate_fields(PROJECT_RULES, &body, ValidationMode::Create)?;
    decode(body)
}

/// Validate an update payload; only fields present are checked and merged.
pub fn parse_project_patch(body: Value) -> Result<ProjectPatch, ValidationError> {
    validate_fields(PROJECT_RULES, &body, ValidationMode::Update)?;
    decode(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "name": "Launch Plan",
            "status": "Active",
            "priority": "High",
            "budget": 1000,
            "dueDate": "2025-01-01T00:00:00Z"
        })
    }

    fn with(field: &str, value: Value) -> Value {
        let mut body = valid_body();
        body[field] = value;
        body
    }

    fn rule(field: &str) -> FieldRule {
        *PROJECT_RULES.iter().find(|r| r.field == field).unwrap()
    }

    #[test]
    fn every_project_field_has_a_rule() {
        let fields: Vec<_> = PROJECT_RULES.iter().map(|r| r.field).collect();
        assert_eq!(fields, vec!["name", "status", "priority", "budget", "dueDate"]);
    }

    #[test]
    fn name_length_boundary() {
        let name = rule("name");
        assert!(name.validate(&json!("ab")).is_err());
        assert!(name.validate(&json!("abc")).is_ok());
        assert!(name.validate(&json!(123)).is_err());
    }

    #[test]
    fn budget_must_be_strictly_positive() {
        let budget = rule("budget");
        assert!(budget.validate(&json!(0)).is_err());
        assert!(budget.validate(&json!(-5.0)).is_err());
        assert!(budget.validate(&json!(0.01)).is_ok());
        assert!(budget.validate(&json!("100")).is_err());
    }

    #[test]
    fn due_date_must_be_iso_datetime() {
        let due = rule("dueDate");
        assert!(due.validate(&json!("not-a-date")).is_err());
        assert!(due.validate(&json!("2025-01-01")).is_err());
        assert!(due.validate(&json!("2025-01-01T00:00:00Z")).is_ok());
        assert!(due.validate(&json!("2025-01-01T09:30:00+02:00")).is_ok());
    }

    #[test]
    fn enums_require_exact_values() {
        assert!(rule("status").validate(&json!("On Hold")).is_ok());
        assert!(rule("status").validate(&json!("Paused")).is_err());
        assert!(rule("priority").validate(&json!("Low")).is_ok());
        assert!(rule("priority").validate(&json!("low")).is_err());
    }

    #[test]
    fn create_requires_every_field() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("priority");
        let err = parse_new_project(body).unwrap_err();
        assert_eq!(err, ValidationError::new("priority", "priority is required"));
    }

    #[test]
    fn create_reports_first_failure_with_field() {
        let err = parse_new_project(with("budget", json!(0))).unwrap_err();
        assert_eq!(err.field, "budget");
        assert_eq!(err.to_string(), "budget: Budget must be a positive number");
    }

    #[test]
    fn create_ignores_client_id() {
        let project = parse_new_project(with("id", json!("client-chosen"))).unwrap();
        assert_eq!(project.name, "Launch Plan");
        assert_eq!(project.due_date.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn update_checks_only_present_fields() {
        let patch = parse_project_patch(json!({"status": "Completed"})).unwrap();
        assert_eq!(patch.status, Some(ProjectStatus::Completed));
        assert_eq!(patch.name, None);

        let err = parse_project_patch(json!({"name": "ab"})).unwrap_err();
        assert_eq!(err.field, "name");

        let err = parse_project_patch(json!({"budget": null})).unwrap_err();
        assert_eq!(err.field, "budget");
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = parse_new_project(json!(["Launch Plan"])).unwrap_err();
        assert_eq!(err.field, BODY_FIELD);
    }
}
