//! Form schema -- the named, ordered definition of a form's fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::field::{Field, FieldPatch};
use crate::idgen;
use crate::integrity::{self, SchemaError};

/// A form definition. Field order is display/tab order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Creation time; never changes after the form is created.
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub fields: Vec<Field>,
}

impl FormSchema {
    /// Creates an empty form with a generated id and the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(idgen::new_form_id(), name, Utc::now())
    }

    /// Creates an empty form with explicit identity.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at,
            fields: Vec::new(),
        }
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_index(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == id)
    }

    /// Fields that may be offered as parents of the derived field `field_id`:
    /// every field except that field itself and any field that is derived.
    ///
    /// Pass `None` for a field that has not been added yet.
    pub fn eligible_parents(&self, field_id: Option<&str>) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| Some(f.id.as_str()) != field_id && !f.is_derived())
            .collect()
    }

    /// Fields that derive directly from `id`, in form order.
    pub fn dependents_of(&self, id: &str) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.depends_on(id)).collect()
    }

    /// Appends a field after checking it keeps the form well formed.
    pub fn add_field(&mut self, field: Field) -> Result<(), SchemaError> {
        integrity::check_field_shape(&field)?;
        if self.field(&field.id).is_some() {
            return Err(SchemaError::DuplicateFieldId(field.id));
        }
        let id = field.id.clone();
        self.fields.push(field);
        if let Err(e) = integrity::check_references(&self.fields, &id) {
            self.fields.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Applies `patch` to the field `id`, returning the updated field.
    ///
    /// Nothing is cleared implicitly when the type changes; options left on a
    /// field that no longer uses them are kept and logged.
    pub fn update_field(&mut self, id: &str, patch: &FieldPatch) -> Result<&Field, SchemaError> {
        let index = self
            .field_index(id)
            .ok_or_else(|| SchemaError::FieldNotFound(id.to_owned()))?;
        let updated = patch.apply_to(&self.fields[index]);
        integrity::check_field_shape(&updated)?;

        let previous = std::mem::replace(&mut self.fields[index], updated);
        if let Err(e) = integrity::check_references(&self.fields, id) {
            self.fields[index] = previous;
            return Err(e);
        }

        let field = &self.fields[index];
        if !field.field_type.has_options() && field.options.as_ref().is_some_and(|o| !o.is_empty()) {
            warn!(field = id, field_type = %field.field_type, "field keeps options its type does not use");
        }
        Ok(field)
    }

    /// Removes the field `id`. Fails while other fields derive from it.
    pub fn remove_field(&mut self, id: &str) -> Result<Field, SchemaError> {
        let index = self
            .field_index(id)
            .ok_or_else(|| SchemaError::FieldNotFound(id.to_owned()))?;
        integrity::check_removable(&self.fields, id)?;
        Ok(self.fields.remove(index))
    }

    /// Moves the field at `from` so that it ends up at position `to`.
    pub fn move_field(&mut self, from: usize, to: usize) -> Result<(), SchemaError> {
        let len = self.fields.len();
        for index in [from, to] {
            if index >= len {
                return Err(SchemaError::IndexOutOfRange { index, len });
            }
        }
        let moved = self.fields.remove(from);
        self.fields.insert(to, moved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DerivedSpec, FieldBuilder, FieldType};
    use crate::graph::GraphError;
    use pretty_assertions::assert_eq;

    fn sample() -> FormSchema {
        let mut form = FormSchema::with_id("form_1", "Signup", Utc::now());
        form.add_field(FieldBuilder::new("a", FieldType::Number).label("A").build())
            .unwrap();
        form.add_field(FieldBuilder::new("b", FieldType::Text).label("B").build())
            .unwrap();
        form.add_field(
            FieldBuilder::new("c", FieldType::Number)
                .label("C")
                .derived(["a"], "a + 1")
                .build(),
        )
        .unwrap();
        form
    }

    fn ids(form: &FormSchema) -> Vec<&str> {
        form.fields.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn new_form_is_empty_with_generated_id() {
        let form = FormSchema::new("Untitled Form");
        assert!(form.id.starts_with("form_"));
        assert!(form.fields.is_empty());
        assert_eq!(form.name, "Untitled Form");
    }

    #[test]
    fn eligible_parents_excludes_self_and_derived() {
        let form = sample();
        let names: Vec<&str> = form.eligible_parents(Some("a")).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(names, vec!["b"]);
        let names: Vec<&str> = form.eligible_parents(None).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let mut form = sample();
        let err = form
            .add_field(FieldBuilder::new("a", FieldType::Text).build())
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateFieldId("a".into()));
        assert_eq!(form.fields.len(), 3);
    }

    #[test]
    fn add_rejects_missing_parent_and_rolls_back() {
        let mut form = sample();
        let err = form
            .add_field(
                FieldBuilder::new("d", FieldType::Number)
                    .derived(["nope"], "nope")
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::Graph(GraphError::MissingParent { .. })));
        assert_eq!(ids(&form), vec!["a", "b", "c"]);
    }

    #[test]
    fn update_rejects_cycle_and_restores() {
        let mut form = sample();
        let patch = FieldPatch {
            derived: Some(Some(DerivedSpec::new(["c"], "c * 2"))),
            ..FieldPatch::default()
        };
        let err = form.update_field("a", &patch).unwrap_err();
        assert!(matches!(err, SchemaError::Graph(GraphError::Cycle(_))));
        assert!(!form.field("a").unwrap().is_derived());
    }

    #[test]
    fn update_allows_chained_derivation() {
        let mut form = sample();
        form.add_field(
            FieldBuilder::new("d", FieldType::Number)
                .label("D")
                .derived(["c"], "c * 2")
                .build(),
        )
        .unwrap();
        let patch = FieldPatch {
            label: Some("Double".into()),
            ..FieldPatch::default()
        };
        assert_eq!(form.update_field("d", &patch).unwrap().label, "Double");
    }

    #[test]
    fn update_unknown_field() {
        let mut form = sample();
        assert_eq!(
            form.update_field("zz", &FieldPatch::default()).unwrap_err(),
            SchemaError::FieldNotFound("zz".into())
        );
    }

    #[test]
    fn remove_blocked_while_parent() {
        let mut form = sample();
        assert!(matches!(form.remove_field("a"), Err(SchemaError::FieldInUse { .. })));
        let removed = form.remove_field("c").unwrap();
        assert_eq!(removed.id, "c");
        form.remove_field("a").unwrap();
        assert_eq!(ids(&form), vec!["b"]);
    }

    #[test]
    fn move_field_reorders_only() {
        let mut form = sample();
        form.move_field(0, 2).unwrap();
        assert_eq!(ids(&form), vec!["b", "c", "a"]);
        form.move_field(2, 0).unwrap();
        assert_eq!(ids(&form), vec!["a", "b", "c"]);
        assert_eq!(
            form.move_field(0, 3),
            Err(SchemaError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn dependents_of_lists_direct_children() {
        let form = sample();
        let deps: Vec<&str> = form.dependents_of("a").iter().map(|f| f.id.as_str()).collect();
        assert_eq!(deps, vec!["c"]);
        assert!(form.dependents_of("b").is_empty());
    }

    #[test]
    fn schema_json_roundtrip() {
        let form = sample();
        let json = serde_json::to_string(&form).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"parentFieldIds\":[\"a\"]"));
        let back: FormSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, form);
    }
}
