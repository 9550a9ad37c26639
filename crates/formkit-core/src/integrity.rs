//! Schema integrity checks applied when a form's field list changes.
//!
//! Every mutation that could leave the form structurally broken (a duplicate
//! id, a duplicate option value, a derived field pointing at a missing field
//! or at itself, a cycle) is rejected up front instead of failing later
//! during recomputation.

use std::collections::HashSet;

use crate::field::Field;
use crate::graph::{DependencyGraph, GraphError};

/// A structural change that would break the form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("field id must not be empty")]
    EmptyFieldId,

    #[error("field {0} already exists")]
    DuplicateFieldId(String),

    #[error("field {0} not found")]
    FieldNotFound(String),

    #[error("field {field} has duplicate option value {value:?}")]
    DuplicateOption { field: String, value: String },

    #[error("field {field} is used by derived fields: {}", .dependents.join(", "))]
    FieldInUse { field: String, dependents: Vec<String> },

    #[error("position {index} is out of range for {len} fields")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Checks the parts of a field that do not depend on the rest of the form.
pub fn check_field_shape(field: &Field) -> Result<(), SchemaError> {
    if field.id.trim().is_empty() {
        return Err(SchemaError::EmptyFieldId);
    }
    if let Some(ref options) = field.options {
        let mut seen = HashSet::new();
        for option in options {
            if !seen.insert(option.value.as_str()) {
                return Err(SchemaError::DuplicateOption {
                    field: field.id.clone(),
                    value: option.value.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Checks that `fields` (already containing the changed field `id`) keeps the
/// derived-field references of `id` well formed.
pub fn check_references(fields: &[Field], id: &str) -> Result<(), SchemaError> {
    DependencyGraph::build(fields).check_field(id)?;
    Ok(())
}

/// Checks that no other field derives from `id`.
pub fn check_removable(fields: &[Field], id: &str) -> Result<(), SchemaError> {
    let dependents: Vec<String> = fields
        .iter()
        .filter(|f| f.id != id && f.depends_on(id))
        .map(|f| f.id.clone())
        .collect();
    if dependents.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::FieldInUse {
            field: id.to_owned(),
            dependents,
        })
    }
}
