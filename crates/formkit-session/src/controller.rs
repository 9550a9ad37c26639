//! [`FormController`] -- the transitions of a form session.
//!
//! Structural edits (add/update/delete/reorder) touch the schema only and do
//! not recompute anything; [`FormController::recompute_all`] is the pass
//! editors run afterwards. Setting a value recomputes every derived field
//! that transitively reads it and revalidates just that field.

use formkit_core::validation::{validate, validate_form};
use formkit_core::{DependencyGraph, ErrorMap, Field, FieldPatch, FieldValue, FormData, FormSchema};
use formkit_formula::{Clock, SystemClock, recompute};
use formkit_storage::FormStore;
use tracing::{debug, info, warn};

use crate::error::{ControllerError, Result};
use crate::state::FormState;

/// Name given to forms created without one.
pub const UNTITLED_FORM: &str = "Untitled Form";

/// Owns the session state and the persistence port.
pub struct FormController {
    state: FormState,
    store: Box<dyn FormStore>,
    clock: Box<dyn Clock>,
}

impl FormController {
    /// Creates a controller that reads the system date for formulas.
    pub fn new(store: Box<dyn FormStore>) -> Self {
        Self::with_clock(store, Box::new(SystemClock))
    }

    pub fn with_clock(store: Box<dyn FormStore>, clock: Box<dyn Clock>) -> Self {
        Self {
            state: FormState::default(),
            store,
            clock,
        }
    }

    // -- Read access ---------------------------------------------------------

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn current_form(&self) -> Option<&FormSchema> {
        self.state.current_form.as_ref()
    }

    pub fn form_data(&self) -> &FormData {
        &self.state.form_data
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.state.errors
    }

    pub fn saved_forms(&self) -> &[FormSchema] {
        &self.state.saved_forms
    }

    fn form(&self) -> Result<&FormSchema> {
        self.state.current_form.as_ref().ok_or(ControllerError::NoActiveForm)
    }

    fn form_mut(&mut self) -> Result<&mut FormSchema> {
        self.state.current_form.as_mut().ok_or(ControllerError::NoActiveForm)
    }

    // -- Session transitions -------------------------------------------------

    /// Makes `schema` the current form: clears values and errors, seeds
    /// defaults for input fields, then computes every derived field.
    pub fn load(&mut self, schema: FormSchema) {
        debug!(form = %schema.id, fields = schema.fields.len(), "loading form");
        self.state.form_data.clear();
        self.state.errors.clear();
        for field in schema.fields.iter().filter(|f| !f.is_derived()) {
            if let Some(ref value) = field.default_value {
                self.state.form_data.set(field.id.clone(), value.clone());
            }
        }
        self.state.current_form = Some(schema);
        self.recompute_derived();
    }

    /// Starts a new, empty form and makes it current.
    pub fn create(&mut self, name: impl Into<String>) -> &FormSchema {
        let name = name.into();
        let name = if name.trim().is_empty() { UNTITLED_FORM.to_owned() } else { name };
        let schema = FormSchema::new(name);
        info!(form = %schema.id, name = %schema.name, "created form");
        self.state.form_data.clear();
        self.state.errors.clear();
        self.state.current_form.insert(schema)
    }

    /// Closes the current form, keeping the saved list.
    pub fn close(&mut self) {
        self.state.clear_session();
    }

    pub fn rename_form(&mut self, name: impl Into<String>) -> Result<()> {
        let form = self.form_mut()?;
        form.name = name.into();
        debug!(form = %form.id, name = %form.name, "renamed form");
        Ok(())
    }

    // -- Structural edits ----------------------------------------------------

    pub fn add_field(&mut self, field: Field) -> Result<()> {
        let form = self.form_mut()?;
        debug!(form = %form.id, field = %field.id, field_type = %field.field_type, "adding field");
        form.add_field(field)?;
        Ok(())
    }

    /// Applies `patch` to a field. A field that was an input and becomes
    /// derived loses its typed value and error; it has no value until the
    /// next [`recompute_all`](Self::recompute_all).
    pub fn update_field(&mut self, id: &str, patch: &FieldPatch) -> Result<()> {
        let form = self.form_mut()?;
        let was_derived = form.field(id).is_some_and(Field::is_derived);
        let now_derived = form.update_field(id, patch)?.is_derived();
        debug!(form = %form.id, field = id, "updated field");
        if now_derived && !was_derived {
            self.state.form_data.remove(id);
            self.state.errors.remove(id);
        }
        Ok(())
    }

    /// Removes a field along with its value and error.
    pub fn delete_field(&mut self, id: &str) -> Result<Field> {
        let removed = self.form_mut()?.remove_field(id)?;
        self.state.form_data.remove(id);
        self.state.errors.remove(id);
        debug!(field = id, "deleted field");
        Ok(removed)
    }

    /// Moves the field at `from` to position `to`. Values and errors are
    /// keyed by id and are unaffected.
    pub fn reorder_field(&mut self, from: usize, to: usize) -> Result<()> {
        self.form_mut()?.move_field(from, to)?;
        Ok(())
    }

    // -- Filling -------------------------------------------------------------

    /// Writes an input value, recomputes the derived fields that depend on
    /// it and revalidates the field.
    pub fn set_value(&mut self, id: &str, value: FieldValue) -> Result<()> {
        let form = self.state.current_form.as_ref().ok_or(ControllerError::NoActiveForm)?;
        let field = form
            .field(id)
            .ok_or_else(|| ControllerError::UnknownField(id.to_owned()))?;
        if field.is_derived() {
            return Err(ControllerError::ReadOnlyField(id.to_owned()));
        }

        self.state.form_data.set(id, value);

        let plan = DependencyGraph::build(&form.fields).descendants(id);
        if !plan.cyclic.is_empty() {
            warn!(field = id, cyclic = ?plan.cyclic, "skipping derived fields caught in a cycle");
        }
        let failed = recompute(&form.fields, &plan.order, &mut self.state.form_data, self.clock.as_ref());
        debug!(field = id, recomputed = plan.order.len(), failed = failed.len(), "value set");

        let message = validate(field, self.state.form_data.get(id), Some(&self.state.form_data));
        self.state.errors.put(id, message);
        Ok(())
    }

    /// Recomputes every derived field of the current form.
    pub fn recompute_all(&mut self) -> Result<()> {
        self.form()?;
        self.recompute_derived();
        Ok(())
    }

    fn recompute_derived(&mut self) {
        let Some(ref form) = self.state.current_form else {
            return;
        };
        let plan = DependencyGraph::build(&form.fields).plan();
        if !plan.cyclic.is_empty() {
            warn!(form = %form.id, cyclic = ?plan.cyclic, "skipping derived fields caught in a cycle");
        }
        recompute(&form.fields, &plan.order, &mut self.state.form_data, self.clock.as_ref());
    }

    /// Validates every field, replacing the error map.
    pub fn validate_all(&mut self) -> Result<&ErrorMap> {
        let errors = validate_form(&self.form()?.fields, &self.state.form_data);
        debug!(invalid = errors.len(), "validated form");
        self.state.errors = errors;
        Ok(&self.state.errors)
    }

    /// Validates the form and returns its values if nothing is invalid.
    pub fn submit(&mut self) -> Result<FormData> {
        if !self.validate_all()?.is_empty() {
            return Err(ControllerError::SubmissionBlocked(self.state.errors.clone()));
        }
        info!(form = %self.form()?.id, "form submitted");
        Ok(self.state.form_data.clone())
    }

    // -- Persistence ---------------------------------------------------------

    /// Refreshes the saved list from storage.
    pub fn load_saved(&mut self) -> &[FormSchema] {
        self.state.saved_forms = self.store.load_all();
        &self.state.saved_forms
    }

    /// Loads the saved form `form_id` as the current form.
    pub fn open_saved(&mut self, form_id: &str) -> Result<()> {
        if !self.state.saved_forms.iter().any(|f| f.id == form_id) {
            self.load_saved();
        }
        let schema = self
            .state
            .saved_forms
            .iter()
            .find(|f| f.id == form_id)
            .cloned()
            .ok_or_else(|| ControllerError::FormNotFound(form_id.to_owned()))?;
        self.load(schema);
        Ok(())
    }

    /// Saves the current form. On failure the session is left as it was.
    pub fn save(&mut self) -> Result<()> {
        let form = self.form()?;
        match self.store.upsert(form) {
            Ok(saved) => {
                self.state.saved_forms = saved;
                Ok(())
            }
            Err(e) => {
                warn!(form = %form.id, error = %e, "failed to save form");
                Err(e.into())
            }
        }
    }

    /// Deletes a saved form. The current form, if any, stays open.
    pub fn delete_saved(&mut self, form_id: &str) -> Result<()> {
        match self.store.remove(form_id) {
            Ok(saved) => {
                self.state.saved_forms = saved;
                Ok(())
            }
            Err(e) => {
                warn!(form = form_id, error = %e, "failed to delete form");
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for FormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
