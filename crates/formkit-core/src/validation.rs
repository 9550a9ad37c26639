//! Field validation rules.
//!
//! Rules run in a fixed order (required, minLength, maxLength, email,
//! passwordRule) and the first failure wins, so a field never carries more
//! than one message.

use std::sync::LazyLock;

use regex::Regex;

use crate::field::Field;
use crate::values::{ErrorMap, FieldValue, FormData, display_string, is_falsy, is_missing};

/// Minimum length enforced by the password rule.
pub const PASSWORD_MIN_LENGTH: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// A failed validation rule. The `Display` output is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("{label} is required")]
    Required { label: String },

    #[error("{label} must be at least {min} characters")]
    TooShort { label: String, min: usize },

    #[error("{label} must not exceed {max} characters")]
    TooLong { label: String, max: usize },

    #[error("{label} must be a valid email address")]
    InvalidEmail { label: String },

    #[error("{label} must be at least 8 characters long")]
    PasswordTooShort { label: String },

    #[error("{label} must contain at least one number")]
    PasswordNeedsDigit { label: String },
}

/// Checks one value against a field's rules.
///
/// Derived fields always pass. `form_data` is accepted for rules that need
/// to look at other fields; none of the built-in rules do.
pub fn check(
    field: &Field,
    value: Option<&FieldValue>,
    _form_data: Option<&FormData>,
) -> Result<(), RuleViolation> {
    if field.is_derived() {
        return Ok(());
    }

    let rules = &field.validations;
    let label = || field.label.clone();

    if rules.required && is_missing(value) {
        return Err(RuleViolation::Required { label: label() });
    }

    // An empty optional field has nothing further to check.
    if !rules.required && is_falsy(value) {
        return Ok(());
    }

    let text = value.map(display_string).unwrap_or_default();
    // UTF-16 code units, as a formula's `.length` counts them.
    let len = text.encode_utf16().count();

    if let Some(min) = rules.min_length.filter(|&m| m > 0) {
        if len < min {
            return Err(RuleViolation::TooShort { label: label(), min });
        }
    }

    if let Some(max) = rules.max_length.filter(|&m| m > 0) {
        if len > max {
            return Err(RuleViolation::TooLong { label: label(), max });
        }
    }

    if rules.email && !(text.is_ascii() && EMAIL_RE.is_match(&text)) {
        return Err(RuleViolation::InvalidEmail { label: label() });
    }

    if rules.password_rule {
        if len < PASSWORD_MIN_LENGTH {
            return Err(RuleViolation::PasswordTooShort { label: label() });
        }
        if !text.chars().any(|c| c.is_ascii_digit()) {
            return Err(RuleViolation::PasswordNeedsDigit { label: label() });
        }
    }

    Ok(())
}

/// Validates one value, returning the error message if a rule fails.
pub fn validate(
    field: &Field,
    value: Option<&FieldValue>,
    form_data: Option<&FormData>,
) -> Option<String> {
    check(field, value, form_data).err().map(|v| v.to_string())
}

/// Validates every field against `form_data`, collecting only failures.
pub fn validate_form(fields: &[Field], form_data: &FormData) -> ErrorMap {
    fields
        .iter()
        .filter_map(|field| {
            validate(field, form_data.get(&field.id), Some(form_data)).map(|msg| (field.id.clone(), msg))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldBuilder, FieldType};
    use serde_json::json;

    fn text(label: &str) -> FieldBuilder {
        FieldBuilder::new("f", FieldType::Text).label(label)
    }

    fn run(field: &Field, value: FieldValue) -> Option<String> {
        validate(field, Some(&value), None)
    }

    #[test]
    fn required_empty_fails_with_label() {
        let field = text("Name").required().build();
        assert_eq!(run(&field, json!("")), Some("Name is required".into()));
        assert_eq!(validate(&field, None, None), Some("Name is required".into()));
        assert_eq!(run(&field, json!(null)), Some("Name is required".into()));
        assert_eq!(run(&field, json!("x")), None);
    }

    #[test]
    fn required_rejects_empty_array() {
        let field = FieldBuilder::new("tags", FieldType::Checkbox)
            .label("Tags")
            .required()
            .build();
        assert!(run(&field, json!([])).is_some());
        assert!(run(&field, json!(["a"])).is_none());
    }

    #[test]
    fn empty_optional_field_skips_rules() {
        let field = text("Email").email().min_length(5).build();
        assert_eq!(validate(&field, None, None), None);
        assert_eq!(run(&field, json!("")), None);
    }

    #[test]
    fn min_length_bounds() {
        let field = text("Code").min_length(5).build();
        assert_eq!(run(&field, json!("ab")), Some("Code must be at least 5 characters".into()));
        assert_eq!(run(&field, json!("abcde")), None);
        assert_eq!(run(&field, json!("abcdef")), None);
    }

    #[test]
    fn max_length_bounds() {
        let field = text("Code").max_length(3).build();
        assert_eq!(run(&field, json!("abcd")), Some("Code must not exceed 3 characters".into()));
        assert_eq!(run(&field, json!("abc")), None);
    }

    #[test]
    fn length_counts_utf16_units() {
        let field = text("Emoji").min_length(4).max_length(4).build();
        assert_eq!(run(&field, json!("😀😀")), None);
        assert!(run(&field, json!("😀")).is_some());
        assert!(run(&field, json!("😀😀😀")).is_some());
        assert_eq!(run(&field, json!("héll")), None);
    }

    #[test]
    fn length_uses_string_form_of_numbers() {
        let field = FieldBuilder::new("n", FieldType::Number)
            .label("Pin")
            .min_length(4)
            .build();
        assert!(run(&field, json!(123)).is_some());
        assert!(run(&field, json!(1234)).is_none());
    }

    #[test]
    fn email_rule() {
        let field = text("Email").email().build();
        assert_eq!(run(&field, json!("a@b.co")), None);
        assert_eq!(
            run(&field, json!("not-an-email")),
            Some("Email must be a valid email address".into())
        );
        assert!(run(&field, json!("a b@c.de")).is_some());
        assert!(run(&field, json!("a@b@c.de")).is_some());
        assert!(run(&field, json!("a@bcde")).is_some());
        assert!(run(&field, json!("ü@b.co")).is_some());
    }

    #[test]
    fn password_rule() {
        let field = text("Password").password_rule().build();
        assert_eq!(run(&field, json!("abcdefg1")), None);
        assert_eq!(
            run(&field, json!("abcdefgh")),
            Some("Password must contain at least one number".into())
        );
        assert_eq!(
            run(&field, json!("ab1")),
            Some("Password must be at least 8 characters long".into())
        );
        // Length takes precedence when both fail.
        assert_eq!(
            run(&field, json!("abc")),
            Some("Password must be at least 8 characters long".into())
        );
    }

    #[test]
    fn first_failing_rule_wins() {
        let field = text("Email").required().min_length(10).email().build();
        assert_eq!(run(&field, json!("a@b.co")), Some("Email must be at least 10 characters".into()));
    }

    #[test]
    fn derived_fields_never_fail() {
        let field = text("Total")
            .required()
            .min_length(100)
            .email()
            .password_rule()
            .derived(["a"], "a * 2")
            .build();
        assert_eq!(validate(&field, None, None), None);
        assert_eq!(run(&field, json!("Error in formula")), None);
        assert_eq!(run(&field, json!("")), None);
    }

    #[test]
    fn validate_form_is_sparse() {
        let fields = vec![
            FieldBuilder::new("name", FieldType::Text).label("Name").required().build(),
            FieldBuilder::new("email", FieldType::Text).label("Email").email().build(),
            FieldBuilder::new("note", FieldType::Textarea).label("Note").build(),
        ];
        let data: FormData = [("email", json!("nope"))].into_iter().collect();
        let errors = validate_form(&fields, &data);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("email"), Some("Email must be a valid email address"));
        assert!(!errors.contains("note"));
    }

    #[test]
    fn check_returns_typed_violation() {
        let field = text("Name").required().build();
        assert!(matches!(
            check(&field, None, None),
            Err(RuleViolation::Required { ref label }) if label == "Name"
        ));
    }
}
