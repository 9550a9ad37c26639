//! Sparse value and error maps for a live form session.
//!
//! In both maps an absent key is meaningful: no entry in [`FormData`] means
//! "nothing entered", no entry in [`ErrorMap`] means "valid". Neither map
//! stores a placeholder value for those states.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// The value of one field. Values are JSON so they persist and substitute
/// into formulas unchanged.
pub type FieldValue = serde_json::Value;

// ---------------------------------------------------------------------------
// FormData
// ---------------------------------------------------------------------------

/// Current input values keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, FieldValue>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// Writes a value, returning the previous one.
    pub fn set(&mut self, id: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(id.into(), value)
    }

    /// Writes `Some` values and removes the key for `None`.
    pub fn put(&mut self, id: &str, value: Option<FieldValue>) {
        match value {
            Some(v) => {
                self.0.insert(id.to_owned(), v);
            }
            None => {
                self.0.remove(id);
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<FieldValue> {
        self.0.remove(id)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for FormData {
    fn from_iter<T: IntoIterator<Item = (K, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a FormData {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// ErrorMap
// ---------------------------------------------------------------------------

/// Validation messages keyed by field id. At most one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<String, String>);

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, message: impl Into<String>) {
        self.0.insert(id.into(), message.into());
    }

    /// Records `Some(message)` or clears the entry for `None`.
    pub fn put(&mut self, id: &str, message: Option<String>) {
        match message {
            Some(m) => {
                self.0.insert(id.to_owned(), m);
            }
            None => {
                self.0.remove(id);
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.0.remove(id)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ErrorMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'a> IntoIterator for &'a ErrorMap {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

/// Returns `true` if the value counts as "not filled in" for `required`:
/// absent, null, empty string or empty array.
pub fn is_missing(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => true,
        Some(FieldValue::String(s)) => s.is_empty(),
        Some(FieldValue::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

/// JavaScript-style falsiness: absent, null, `false`, `0`, `NaN` and `""`.
pub fn is_falsy(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => true,
        Some(FieldValue::Bool(b)) => !b,
        Some(FieldValue::Number(n)) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
        Some(FieldValue::String(s)) => s.is_empty(),
        Some(FieldValue::Array(_)) | Some(FieldValue::Object(_)) => false,
    }
}

/// String form of a value, as JavaScript's `String(value)` renders it.
pub fn display_string(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "null".to_owned(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => format_number(f),
            _ => n.to_string(),
        },
        FieldValue::String(s) => s.clone(),
        FieldValue::Array(items) => items
            .iter()
            .map(|v| match v {
                FieldValue::Null => String::new(),
                other => display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        FieldValue::Object(_) => "[object Object]".to_owned(),
    }
}

/// Formats a float the way JavaScript prints numbers: integral values have
/// no fractional part, non-finite values use their JS names, and magnitudes
/// below 1e-6 or from 1e21 up use exponent form (`1e-7`, `1e+21`).
pub fn format_number(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_owned()
    } else if f.is_infinite() {
        let name = if f > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_owned()
    } else if f == 0.0 {
        // -0 prints as "0" in JS.
        "0".to_owned()
    } else if f.abs() < 1e-6 || f.abs() >= 1e21 {
        let exp = format!("{f:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        }
    } else if f == f.trunc() {
        format!("{}", f as i128)
    } else {
        format!("{f}")
    }
}
