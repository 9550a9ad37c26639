//! Session state owned by the controller.

use formkit_core::{ErrorMap, FormData, FormSchema};

/// Everything an editor or filler needs to render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    /// Form being edited or filled, if any.
    pub current_form: Option<FormSchema>,

    /// Values keyed by field id. Derived entries are written only by the
    /// derived-field engine.
    pub form_data: FormData,

    /// Validation messages keyed by field id.
    pub errors: ErrorMap,

    /// Mirror of the persisted list as of the last load/save/delete.
    pub saved_forms: Vec<FormSchema>,
}

impl FormState {
    /// Drops the open form and its values and errors; keeps the saved list.
    pub fn clear_session(&mut self) {
        self.current_form = None;
        self.form_data.clear();
        self.errors.clear();
    }
}
