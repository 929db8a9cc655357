//! Contract validation.
//!
//! A payload passes through two stages before a handler sees it:
//!
//! 1. **Shape**: the JSON is deserialized into the contract struct. `serde_path_to_error` gives
//!    the path of the first field that does not fit (missing, wrong JSON type, unknown enum
//!    token, unparseable date). Shape failures stop here with a single issue.
//! 2. **Constraints**: [`Validate::validate`] checks every field-level rule (e-mail syntax,
//!    minimum lengths, positive numbers, non-null patches) and collects *all* failures.
//!
//! Either stage yields [`ValidationErrors`], a list of [`FieldIssue`]s.

use midwifery_types::{EmailAddress, NonEmptyText, Patch};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Why a field failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    WrongType,
    OutOfRange,
    FormatInvalid,
}

/// One failing field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldIssue {
    /// Dotted path to the field; empty for the payload itself.
    pub path: String,
    pub kind: IssueKind,
    pub message: String,
}

/// A rejected payload.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid input: {}", describe(.issues))]
pub struct ValidationErrors {
    pub issues: Vec<FieldIssue>,
}

fn describe(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| {
            if issue.path.is_empty() {
                issue.message.clone()
            } else {
                format!("{}: {}", issue.path, issue.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn single(path: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                path: path.into(),
                kind,
                message: message.into(),
            }],
        }
    }

    /// Returns the issue recorded for `path`, if any.
    pub fn issue(&self, path: &str) -> Option<&FieldIssue> {
        self.issues.iter().find(|issue| issue.path == path)
    }
}

/// Field-level constraint checks for a contract.
pub trait Validate {
    fn validate(&self, v: &mut Validator);
}

/// Collects constraint failures.
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<FieldIssue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, path: &str, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            path: path.to_owned(),
            kind,
            message: message.into(),
        });
    }

    /// Text must contain at least one non-whitespace character.
    pub fn text(&mut self, path: &str, value: &str) {
        if let Err(e) = NonEmptyText::new(value) {
            self.issue(path, IssueKind::OutOfRange, e.to_string());
        }
    }

    pub fn email(&mut self, path: &str, value: &str) {
        if EmailAddress::parse(value).is_err() {
            self.issue(path, IssueKind::FormatInvalid, "must be a valid email address");
        }
    }

    pub fn min_chars(&mut self, path: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.issue(
                path,
                IssueKind::OutOfRange,
                format!("must contain at least {min} characters"),
            );
        }
    }

    /// Integers declared positive reject zero and negatives.
    pub fn positive_int(&mut self, path: &str, value: i64) {
        if value <= 0 {
            self.issue(path, IssueKind::OutOfRange, "must be greater than 0");
        }
    }

    /// Entity references are positive integers.
    pub fn id(&mut self, path: &str, value: i64) {
        self.positive_int(path, value);
    }

    /// Prices are finite, strictly positive, and still positive once rounded to cents.
    pub fn price(&mut self, path: &str, value: f64) {
        const MAX_PRICE: f64 = 99_999_999.99;

        if !value.is_finite() {
            self.issue(path, IssueKind::WrongType, "must be a finite number");
        } else if value <= 0.0 || (value * 100.0).round() <= 0.0 {
            self.issue(path, IssueKind::OutOfRange, "must be greater than 0");
        } else if value > MAX_PRICE {
            self.issue(
                path,
                IssueKind::OutOfRange,
                format!("must not exceed {MAX_PRICE}"),
            );
        }
    }

    /// Optional-but-not-nullable patch fields reject an explicit `null`.
    pub fn not_null<T>(&mut self, path: &str, value: &Patch<T>) {
        if value.is_null() {
            self.issue(path, IssueKind::WrongType, "cannot be null");
        }
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                issues: self.issues,
            })
        }
    }
}

/// Deserializes and validates a payload against contract `T`.
///
/// A `null` payload is treated as an empty object so that procedures without input accept both.
pub fn parse_contract<T>(payload: serde_json::Value) -> Result<T, ValidationErrors>
where
    T: DeserializeOwned + Validate,
{
    let payload = match payload {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        other => other,
    };

    let input: T = serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        let message = err.into_inner().to_string();
        shape_issue(&path, message)
    })?;

    let mut v = Validator::new();
    input.validate(&mut v);
    v.finish()?;

    Ok(input)
}

fn shape_issue(path: &str, message: String) -> ValidationErrors {
    let base = match path {
        "." | "" => "",
        other => other,
    };

    if let Some(field) = missing_field_name(&message) {
        let path = if base.is_empty() {
            field.to_owned()
        } else {
            format!("{base}.{field}")
        };
        return ValidationErrors::single(path, IssueKind::Missing, "required");
    }

    ValidationErrors::single(base, classify(&message), message)
}

fn missing_field_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

fn classify(message: &str) -> IssueKind {
    if message.starts_with("invalid type") {
        IssueKind::WrongType
    } else if message.starts_with("invalid value")
        || message.starts_with("invalid length")
        || message.contains("out of range")
    {
        IssueKind::OutOfRange
    } else {
        IssueKind::FormatInvalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        email: String,
        count: i64,
        #[serde(default)]
        label: Patch<String>,
    }

    impl Validate for Probe {
        fn validate(&self, v: &mut Validator) {
            v.email("email", &self.email);
            v.positive_int("count", self.count);
            v.not_null("label", &self.label);
        }
    }

    #[test]
    fn accepts_valid_payload() {
        let probe: Probe =
            parse_contract(json!({"email": "a@b.co", "count": 3})).expect("should pass");
        assert_eq!(probe.count, 3);
        assert!(probe.label.is_unset());
    }

    #[test]
    fn missing_field_reports_its_path() {
        let err = parse_contract::<Probe>(json!({"email": "a@b.co"})).expect_err("missing");
        let issue = err.issue("count").expect("issue for count");
        assert_eq!(issue.kind, IssueKind::Missing);
    }

    #[test]
    fn null_payload_is_an_empty_object() {
        let err = parse_contract::<Probe>(serde_json::Value::Null).expect_err("missing");
        assert_eq!(err.issues[0].kind, IssueKind::Missing);
        assert_eq!(err.issues[0].path, "email");
    }

    #[test]
    fn wrong_type_is_classified() {
        let err =
            parse_contract::<Probe>(json!({"email": "a@b.co", "count": "three"})).expect_err("type");
        let issue = err.issue("count").expect("issue for count");
        assert_eq!(issue.kind, IssueKind::WrongType);
    }

    #[test]
    fn non_object_payload_is_a_root_wrong_type() {
        let err = parse_contract::<Probe>(json!("hello")).expect_err("type");
        assert_eq!(err.issues[0].path, "");
        assert_eq!(err.issues[0].kind, IssueKind::WrongType);
    }

    #[test]
    fn constraint_failures_are_collected() {
        let err = parse_contract::<Probe>(json!({
            "email": "not-an-email",
            "count": 0,
            "label": null
        }))
        .expect_err("constraints");

        assert_eq!(err.issues.len(), 3);
        assert_eq!(err.issue("email").unwrap().kind, IssueKind::FormatInvalid);
        assert_eq!(err.issue("count").unwrap().kind, IssueKind::OutOfRange);
        assert_eq!(err.issue("label").unwrap().kind, IssueKind::WrongType);
    }

    #[test]
    fn price_rules() {
        let mut v = Validator::new();
        v.price("a", 50.0);
        v.price("b", 0.0);
        v.price("c", -3.5);
        v.price("d", 0.001);
        v.price("e", f64::INFINITY);
        let err = v.finish().expect_err("some prices invalid");

        assert!(err.issue("a").is_none());
        assert_eq!(err.issue("b").unwrap().kind, IssueKind::OutOfRange);
        assert_eq!(err.issue("c").unwrap().kind, IssueKind::OutOfRange);
        assert_eq!(err.issue("d").unwrap().kind, IssueKind::OutOfRange);
        assert_eq!(err.issue("e").unwrap().kind, IssueKind::WrongType);
    }

    #[test]
    fn display_lists_every_issue() {
        let err = ValidationErrors {
            issues: vec![
                FieldIssue {
                    path: "email".into(),
                    kind: IssueKind::FormatInvalid,
                    message: "must be a valid email address".into(),
                },
                FieldIssue {
                    path: "password".into(),
                    kind: IssueKind::OutOfRange,
                    message: "must contain at least 6 characters".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "invalid input: email: must be a valid email address; password: must contain at least 6 characters"
        );
    }
}
