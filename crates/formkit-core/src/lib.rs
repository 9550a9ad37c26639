//! Core types for the formkit form engine.
//!
//! This crate holds the schema model (forms and their typed fields), the
//! sparse value and error maps that make up a live form session, id
//! generation, the field validation rules, and the structural integrity
//! checks that keep derived-field references well formed.

pub mod field;
pub mod form;
pub mod graph;
pub mod idgen;
pub mod integrity;
pub mod validation;
pub mod values;

pub use field::{DerivedSpec, Field, FieldBuilder, FieldPatch, FieldType, SelectOption, ValidationRules};
pub use form::FormSchema;
pub use graph::{DependencyGraph, GraphError};
pub use integrity::SchemaError;
pub use values::{ErrorMap, FieldValue, FormData};
