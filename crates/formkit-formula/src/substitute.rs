//! Textual substitution of parent field ids into formula text.

use formkit_core::FormData;
use regex::{Captures, Regex};

use crate::error::{FormulaError, Result};

/// Text written in place of a parent that has no value.
const ABSENT: &str = "undefined";

/// Replaces each whole-token occurrence of a parent id in `formula` with
/// the JSON form of that parent's current value (`undefined` when absent).
///
/// All ids are matched in one pass, longest first, so a value that happens
/// to contain another parent's id is never rewritten a second time.
pub fn substitute_parents(formula: &str, parents: &[String], data: &FormData) -> Result<String> {
    let mut ids: Vec<&str> = parents.iter().map(String::as_str).filter(|id| !id.is_empty()).collect();
    if ids.is_empty() {
        return Ok(formula.to_owned());
    }
    ids.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    ids.dedup();

    let alternation = ids.iter().map(|id| regex::escape(id)).collect::<Vec<_>>().join("|");
    let pattern = Regex::new(&format!(r"\b(?:{})\b", alternation))
        .map_err(|e| FormulaError::Substitution(e.to_string()))?;

    let mut failure = None;
    let replaced = pattern.replace_all(formula, |caps: &Captures<'_>| {
        let id = &caps[0];
        match data.get(id) {
            None => ABSENT.to_owned(),
            Some(value) => serde_json::to_string(value).unwrap_or_else(|e| {
                failure.get_or_insert_with(|| e.to_string());
                ABSENT.to_owned()
            }),
        }
    });
    match failure {
        Some(message) => Err(FormulaError::Substitution(message)),
        None => Ok(replaced.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parents(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn replaces_whole_tokens_only() {
        let data: FormData = [("a", json!(5)), ("ab", json!(7))].into_iter().collect();
        assert_eq!(
            substitute_parents("a + ab + cab + a_1", &parents(&["a", "ab"]), &data).unwrap(),
            "5 + 7 + cab + a_1"
        );
    }

    #[test]
    fn strings_become_json_literals() {
        let data: FormData = [("name", json!("O\"Brien"))].into_iter().collect();
        assert_eq!(
            substitute_parents("name.length", &parents(&["name"]), &data).unwrap(),
            r#""O\"Brien".length"#
        );
    }

    #[test]
    fn absent_parent_is_undefined() {
        let data = FormData::new();
        assert_eq!(
            substitute_parents("x * 2", &parents(&["x"]), &data).unwrap(),
            "undefined * 2"
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let data: FormData = [("a", json!("b")), ("b", json!(1))].into_iter().collect();
        assert_eq!(
            substitute_parents("a + b", &parents(&["a", "b"]), &data).unwrap(),
            r#""b" + 1"#
        );
    }

    #[test]
    fn generated_ids_and_arrays() {
        let data: FormData = [("field_1700000000000", json!(["x", "y"]))].into_iter().collect();
        assert_eq!(
            substitute_parents(
                "field_1700000000000.join(\"-\")",
                &parents(&["field_1700000000000"]),
                &data
            )
            .unwrap(),
            r#"["x","y"].join("-")"#
        );
    }

    #[test]
    fn no_parents_leaves_text_alone() {
        assert_eq!(
            substitute_parents("currentYear - 1", &[], &FormData::new()).unwrap(),
            "currentYear - 1"
        );
    }
}
