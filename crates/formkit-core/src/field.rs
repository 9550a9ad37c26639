//! Field definitions -- one input of a form.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::values::FieldValue;

// ---------------------------------------------------------------------------
// Field type
// ---------------------------------------------------------------------------

/// The closed set of input kinds a field can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Date,
}

impl FieldType {
    /// All variants, in editor display order.
    pub const ALL: [FieldType; 7] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Textarea,
        FieldType::Select,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Date,
    ];

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
        }
    }

    /// Returns `true` for types whose value is picked from `options`.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }

    /// Converts raw text input into the value a renderer of this type stores.
    ///
    /// Numbers become JSON numbers, checkboxes become booleans and dates are
    /// normalized to `YYYY-MM-DD`. An empty string is kept as an empty string
    /// for every type so that `required` can flag it.
    pub fn parse_input(&self, raw: &str) -> Result<FieldValue, InputError> {
        if raw.is_empty() {
            return Ok(FieldValue::String(String::new()));
        }
        match self {
            Self::Number => {
                let trimmed = raw.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(FieldValue::from(i));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(FieldValue::Number)
                    .ok_or_else(|| InputError::new(*self, raw))
            }
            Self::Checkbox => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(FieldValue::Bool(true)),
                "false" | "off" | "no" | "0" => Ok(FieldValue::Bool(false)),
                _ => Err(InputError::new(*self, raw)),
            },
            Self::Date => {
                let trimmed = raw.trim();
                // Accept a full timestamp and keep only the date part.
                let date_part = trimmed.split('T').next().unwrap_or(trimmed);
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map(|d| FieldValue::String(d.format("%Y-%m-%d").to_string()))
                    .map_err(|_| InputError::new(*self, raw))
            }
            Self::Text | Self::Textarea | Self::Select | Self::Radio => {
                Ok(FieldValue::String(raw.to_owned()))
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown field type: {s}"))
    }
}

/// Raw input that cannot be converted for a field type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field_type} input: {raw:?}")]
pub struct InputError {
    pub field_type: FieldType,
    pub raw: String,
}

impl InputError {
    fn new(field_type: FieldType, raw: &str) -> Self {
        Self {
            field_type,
            raw: raw.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field parts
// ---------------------------------------------------------------------------

/// Validation rules attached to a field. Every rule is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Value must look like `local@domain.tld`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub email: bool,

    /// At least 8 characters and at least one digit.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub password_rule: bool,
}

impl ValidationRules {
    /// Returns `true` if no rule is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One choice of a `select` or `radio` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Derivation of a field's value from other fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSpec {
    /// Ids of the fields the formula reads, in editor order.
    #[serde(default)]
    pub parent_field_ids: Vec<String>,

    /// Expression over the parent ids and the utility bindings.
    #[serde(default)]
    pub formula: String,
}

impl DerivedSpec {
    pub fn new<I, S>(parents: I, formula: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parent_field_ids: parents.into_iter().map(Into::into).collect(),
            formula: formula.into(),
        }
    }

    /// Returns `true` if `id` is one of the parents.
    pub fn depends_on(&self, id: &str) -> bool {
        self.parent_field_ids.iter().any(|p| p == id)
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// One input definition within a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique within the form and immutable after creation.
    pub id: String,

    /// Input kind (serialized as "type").
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Seed value for non-derived fields when a form is loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,

    #[serde(default)]
    pub validations: ValidationRules,

    /// Choices for `select` / `radio` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedSpec>,
}

impl Field {
    /// Returns `true` if the value of this field is computed.
    pub fn is_derived(&self) -> bool {
        self.derived.is_some()
    }

    /// A field is complete once it has a non-blank label.
    pub fn is_complete(&self) -> bool {
        !self.label.trim().is_empty()
    }

    /// Parent ids of a derived field; empty for plain inputs.
    pub fn parent_ids(&self) -> &[String] {
        self.derived
            .as_ref()
            .map(|d| d.parent_field_ids.as_slice())
            .unwrap_or(&[])
    }

    /// Returns `true` if this field derives directly from `id`.
    pub fn depends_on(&self, id: &str) -> bool {
        self.derived.as_ref().is_some_and(|d| d.depends_on(id))
    }
}

/// Builder for constructing [`Field`] values.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Creates a builder for a field with the given id and type.
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: Field {
                id: id.into(),
                field_type,
                ..Field::default()
            },
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.field.label = label.into();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.field.placeholder = Some(placeholder.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.field.default_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.field.validations.required = true;
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.field.validations.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.field.validations.max_length = Some(n);
        self
    }

    pub fn email(mut self) -> Self {
        self.field.validations.email = true;
        self
    }

    pub fn password_rule(mut self) -> Self {
        self.field.validations.password_rule = true;
        self
    }

    pub fn validations(mut self, rules: ValidationRules) -> Self {
        self.field.validations = rules;
        self
    }

    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.field
            .options
            .get_or_insert_with(Vec::new)
            .push(SelectOption::new(value, label));
        self
    }

    pub fn derived<I, S>(mut self, parents: I, formula: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field.derived = Some(DerivedSpec::new(parents, formula));
        self
    }

    pub fn build(self) -> Field {
        self.field
    }
}

/// Partial update for a field.
///
/// Only `Some` members are applied. The id is deliberately absent: field ids
/// never change. Nested `Option`s distinguish "leave alone" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub field_type: Option<FieldType>,
    pub label: Option<String>,
    pub placeholder: Option<Option<String>>,
    pub default_value: Option<Option<FieldValue>>,
    pub validations: Option<ValidationRules>,
    pub options: Option<Option<Vec<SelectOption>>>,
    pub derived: Option<Option<DerivedSpec>>,
}

impl FieldPatch {
    /// Returns `true` if applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns a copy of `field` with the patch applied.
    pub fn apply_to(&self, field: &Field) -> Field {
        let mut out = field.clone();
        if let Some(t) = self.field_type {
            out.field_type = t;
        }
        if let Some(ref label) = self.label {
            out.label = label.clone();
        }
        if let Some(ref p) = self.placeholder {
            out.placeholder = p.clone();
        }
        if let Some(ref v) = self.default_value {
            out.default_value = v.clone();
        }
        if let Some(ref rules) = self.validations {
            out.validations = rules.clone();
        }
        if let Some(ref options) = self.options {
            out.options = options.clone();
        }
        if let Some(ref derived) = self.derived {
            out.derived = derived.clone();
        }
        out
    }
}
