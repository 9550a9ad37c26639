//! Controller error types.

use formkit_core::{ErrorMap, SchemaError};
use formkit_storage::StorageError;

/// Why a controller transition was refused.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("no form is open")]
    NoActiveForm,

    #[error("field {0} not found")]
    UnknownField(String),

    #[error("field {0} is derived and cannot be set directly")]
    ReadOnlyField(String),

    #[error("form {0} is not saved")]
    FormNotFound(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Submission found validation errors; the map holds them.
    #[error("form has {} invalid field(s)", .0.len())]
    SubmissionBlocked(ErrorMap),
}

impl ControllerError {
    /// Returns `true` for failures of the persistence layer.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
