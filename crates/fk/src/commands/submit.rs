//! `fk submit` -- fill a form and submit it.

use anyhow::Result;
use formkit_session::ControllerError;

use crate::cli::FillArgs;
use crate::commands::apply_values;
use crate::context::{RuntimeContext, open_form};
use crate::output::{SessionView, format_session, output_json};

/// Execute the `fk submit` command.
///
/// Prints the submitted values on success. When fields are invalid the
/// values and errors are printed and the command fails.
pub fn run(ctx: &RuntimeContext, args: &FillArgs) -> Result<()> {
    let mut controller = open_form(ctx, &args.form)?;
    apply_values(&mut controller, &args.values)?;

    match controller.submit() {
        Ok(data) => {
            if ctx.json {
                output_json(&data);
            } else if !ctx.quiet {
                if let Some(form) = controller.current_form() {
                    print!("{}", format_session(form, &data, controller.errors()));
                    println!();
                    println!("Submitted {}", form.name);
                }
            }
            Ok(())
        }
        Err(ControllerError::SubmissionBlocked(errors)) => {
            if let Some(form) = controller.current_form() {
                if ctx.json {
                    output_json(&SessionView {
                        form: &form.id,
                        values: controller.form_data(),
                        errors: &errors,
                    });
                } else {
                    print!("{}", format_session(form, controller.form_data(), &errors));
                }
            }
            Err(ControllerError::SubmissionBlocked(errors).into())
        }
        Err(e) => Err(e.into()),
    }
}
