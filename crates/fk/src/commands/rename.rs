//! `fk rename` -- rename a saved form.

use anyhow::Result;

use crate::cli::RenameArgs;
use crate::context::{RuntimeContext, open_form};
use crate::output::output_json;

/// Execute the `fk rename` command.
pub fn run(ctx: &RuntimeContext, args: &RenameArgs) -> Result<()> {
    let mut controller = open_form(ctx, &args.form)?;
    controller.rename_form(args.name.as_str())?;
    controller.save()?;

    if let Some(form) = controller.current_form() {
        if ctx.json {
            output_json(form);
        } else if !ctx.quiet {
            println!("Renamed {} to {}", form.id, form.name);
        }
    }
    Ok(())
}
