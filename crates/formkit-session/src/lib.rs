//! Form session state and the transitions that change it.
//!
//! A [`FormController`] owns one [`FormState`]: the form being edited or
//! filled, its live values and errors, and the list of saved forms. Every
//! transition takes `&mut self`, so there is exactly one writer.

pub mod controller;
pub mod error;
pub mod state;

pub use controller::{FormController, UNTITLED_FORM};
pub use error::{ControllerError, Result};
pub use state::FormState;
