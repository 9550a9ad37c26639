//! Computing derived field values from their parents.

use formkit_core::{Field, FieldValue, FormData};
use tracing::{debug, warn};

use crate::MAX_FORMULA_LEN;
use crate::clock::Clock;
use crate::error::{FormulaError, Result};
use crate::eval::evaluate;
use crate::substitute::substitute_parents;

/// Value stored in place of a derived field whose formula failed.
pub const FORMULA_ERROR_SENTINEL: &str = "Error in formula";

/// Outcome of computing one derived field.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedValue {
    /// The field is not derived, or the formula produced `undefined`.
    Undefined,
    Value(FieldValue),
    /// The formula failed; the field shows the sentinel.
    Failed(FormulaError),
}

impl DerivedValue {
    /// What the form stores for this outcome; `None` means "no value".
    pub fn into_field_value(self) -> Option<FieldValue> {
        match self {
            Self::Undefined => None,
            Self::Value(v) => Some(v),
            Self::Failed(_) => Some(FieldValue::String(FORMULA_ERROR_SENTINEL.to_owned())),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Evaluates a derived field's formula against the current form data.
///
/// Never fails: formula errors are logged and reported as
/// [`DerivedValue::Failed`].
pub fn compute_derived(field: &Field, data: &FormData, clock: &dyn Clock) -> DerivedValue {
    let Some(ref derived) = field.derived else {
        return DerivedValue::Undefined;
    };
    match run(&derived.formula, &derived.parent_field_ids, data, clock) {
        Ok(Some(value)) => {
            debug!(field = %field.id, %value, "computed derived field");
            DerivedValue::Value(value)
        }
        Ok(None) => {
            debug!(field = %field.id, "derived field is undefined");
            DerivedValue::Undefined
        }
        Err(error) => {
            warn!(field = %field.id, formula = %derived.formula, %error, "derived field formula failed");
            DerivedValue::Failed(error)
        }
    }
}

fn run(formula: &str, parents: &[String], data: &FormData, clock: &dyn Clock) -> Result<Option<FieldValue>> {
    if formula.len() > MAX_FORMULA_LEN {
        return Err(FormulaError::TooLong {
            len: formula.len(),
            max: MAX_FORMULA_LEN,
        });
    }
    let source = substitute_parents(formula, parents, data)?;
    evaluate(&source, clock)?.into_field_value()
}

/// Recomputes `order` (derived field ids, parents first) in place, writing
/// each result into `data` before the next field reads it. Ids that are not
/// derived fields of `fields` are skipped.
///
/// Returns the ids whose formula failed.
pub fn recompute(fields: &[Field], order: &[String], data: &mut FormData, clock: &dyn Clock) -> Vec<String> {
    let mut failed = Vec::new();
    for id in order {
        let Some(field) = fields.iter().find(|f| &f.id == id && f.is_derived()) else {
            continue;
        };
        let outcome = compute_derived(field, data, clock);
        if outcome.is_failure() {
            failed.push(id.clone());
        }
        data.put(id, outcome.into_field_value());
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use formkit_core::{FieldBuilder, FieldType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn clock() -> FixedClock {
        FixedClock::ymd(2025, 1, 10).unwrap()
    }

    fn derived(id: &str, parents: &[&str], formula: &str) -> Field {
        FieldBuilder::new(id, FieldType::Number)
            .label(id)
            .derived(parents.iter().copied(), formula)
            .build()
    }

    #[test]
    fn plain_field_is_undefined() {
        let field = FieldBuilder::new("a", FieldType::Text).label("A").build();
        assert_eq!(compute_derived(&field, &FormData::new(), &clock()), DerivedValue::Undefined);
    }

    #[test]
    fn simple_fan_out() {
        let field = derived("b", &["a"], "a + 1");
        let data: FormData = [("a", json!(5))].into_iter().collect();
        assert_eq!(compute_derived(&field, &data, &clock()), DerivedValue::Value(json!(6)));
    }

    #[test]
    fn age_from_date_input() {
        let field = derived("age", &["dob"], "currentYear - new Date(dob).getFullYear()");
        let data: FormData = [("dob", json!("1990-04-01"))].into_iter().collect();
        assert_eq!(compute_derived(&field, &data, &clock()), DerivedValue::Value(json!(35)));
    }

    #[test]
    fn string_results_and_concatenation() {
        let field = derived("full", &["first", "last"], "first + \" \" + last");
        let data: FormData = [("first", json!("Ada")), ("last", json!("Lovelace"))]
            .into_iter()
            .collect();
        assert_eq!(
            compute_derived(&field, &data, &clock()),
            DerivedValue::Value(json!("Ada Lovelace"))
        );
    }

    #[test]
    fn missing_parent_value_gives_nan() {
        let field = derived("b", &["a"], "a * 2");
        assert_eq!(
            compute_derived(&field, &FormData::new(), &clock()).into_field_value(),
            Some(json!("NaN"))
        );
    }

    #[test]
    fn unparsable_formula_yields_sentinel() {
        let field = derived("b", &["a"], "a +* 2");
        let data: FormData = [("a", json!(1))].into_iter().collect();
        let outcome = compute_derived(&field, &data, &clock());
        assert!(outcome.is_failure());
        assert_eq!(outcome.into_field_value(), Some(json!(FORMULA_ERROR_SENTINEL)));
    }

    #[test]
    fn unbound_name_yields_sentinel() {
        let field = derived("b", &["a"], "a + other");
        let data: FormData = [("a", json!(1))].into_iter().collect();
        assert!(matches!(
            compute_derived(&field, &data, &clock()),
            DerivedValue::Failed(FormulaError::UnboundName(ref n)) if n == "other"
        ));
    }

    #[test]
    fn overlong_formula_rejected() {
        let field = derived("b", &[], &"1".repeat(MAX_FORMULA_LEN + 1));
        assert!(matches!(
            compute_derived(&field, &FormData::new(), &clock()),
            DerivedValue::Failed(FormulaError::TooLong { .. })
        ));
    }

    #[test]
    fn undefined_result_clears_value() {
        let field = derived("b", &["a"], "a");
        assert_eq!(compute_derived(&field, &FormData::new(), &clock()), DerivedValue::Undefined);
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let field = derived("b", &["a"], "a * currentYear + today.getDate()");
        let data: FormData = [("a", json!(2))].into_iter().collect();
        let first = compute_derived(&field, &data, &clock());
        assert_eq!(first, compute_derived(&field, &data, &clock()));
        assert_eq!(first, DerivedValue::Value(json!(4060)));
    }

    #[test]
    fn recompute_follows_order_and_reports_failures() {
        let fields = vec![
            FieldBuilder::new("a", FieldType::Number).label("a").build(),
            derived("b", &["a"], "a + 1"),
            derived("c", &["b"], "b * 10"),
            derived("bad", &["a"], "a +"),
        ];
        let mut data: FormData = [("a", json!(1)), ("c", json!(0))].into_iter().collect();
        let order: Vec<String> = ["b", "c", "bad", "a"].iter().map(|s| s.to_string()).collect();
        let failed = recompute(&fields, &order, &mut data, &clock());
        assert_eq!(failed, vec!["bad".to_string()]);
        assert_eq!(data.get("b"), Some(&json!(2)));
        assert_eq!(data.get("c"), Some(&json!(20)));
        assert_eq!(data.get("bad"), Some(&json!(FORMULA_ERROR_SENTINEL)));
        assert_eq!(data.get("a"), Some(&json!(1)));
    }
}
