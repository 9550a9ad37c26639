//! `fk fill` -- fill a form and show the resulting values and errors.
//!
//! Values are not stored; each run starts from the form's defaults.

use anyhow::Result;

use crate::cli::FillArgs;
use crate::commands::apply_values;
use crate::context::{RuntimeContext, open_form};
use crate::output::{SessionView, format_session, output_json};

/// Execute the `fk fill` command.
pub fn run(ctx: &RuntimeContext, args: &FillArgs) -> Result<()> {
    let mut controller = open_form(ctx, &args.form)?;
    apply_values(&mut controller, &args.values)?;

    let Some(form) = controller.current_form() else {
        return Ok(());
    };
    if ctx.json {
        output_json(&SessionView {
            form: &form.id,
            values: controller.form_data(),
            errors: controller.errors(),
        });
    } else {
        print!("{}", format_session(form, controller.form_data(), controller.errors()));
    }
    Ok(())
}
