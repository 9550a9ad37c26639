//! Command handlers, one module per subcommand.

pub mod delete;
pub mod field;
pub mod fill;
pub mod init;
pub mod list;
pub mod new;
pub mod rename;
pub mod show;
pub mod submit;
pub mod version;

use anyhow::{Context, Result, bail};
use formkit_core::SelectOption;
use formkit_session::FormController;

/// Splits `id=value` at the first `=`.
pub fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => Ok((id.trim(), value)),
        _ => bail!("expected id=value, got '{}'", raw),
    }
}

/// Parses `value` or `value:label` into an option.
pub fn parse_option(raw: &str) -> SelectOption {
    match raw.split_once(':') {
        Some((value, label)) => SelectOption::new(value.trim(), label.trim()),
        None => SelectOption::new(raw.trim(), raw.trim()),
    }
}

/// Applies `id=value` assignments to the current form, converting each raw
/// value according to its field's type.
pub fn apply_values(controller: &mut FormController, assignments: &[String]) -> Result<()> {
    for raw in assignments {
        let (id, text) = parse_assignment(raw)?;
        let field_type = controller
            .current_form()
            .and_then(|form| form.field(id))
            .map(|field| field.field_type)
            .with_context(|| format!("field '{}' not found", id))?;
        let value = field_type.parse_input(text)?;
        controller
            .set_value(id, value)
            .with_context(|| format!("failed to set '{}'", id))?;
    }
    Ok(())
}
