//! `fk new` -- create and save an empty form.

use anyhow::Result;

use crate::cli::NewArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `fk new` command.
pub fn run(ctx: &RuntimeContext, args: &NewArgs) -> Result<()> {
    let mut controller = ctx.controller()?;
    controller.create(args.name.as_str());
    controller.save()?;

    let Some(form) = controller.current_form() else {
        return Ok(());
    };
    if ctx.json {
        output_json(form);
    } else if ctx.quiet {
        println!("{}", form.id);
    } else {
        println!("Created form {}: {}", form.id, form.name);
    }
    Ok(())
}
