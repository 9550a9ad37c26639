//! `fk delete` -- delete a saved form.

use anyhow::Result;

use crate::cli::DeleteArgs;
use crate::context::{RuntimeContext, resolve_form};
use crate::output::output_json;

/// Execute the `fk delete` command.
pub fn run(ctx: &RuntimeContext, args: &DeleteArgs) -> Result<()> {
    let mut controller = ctx.controller()?;
    let id = resolve_form(controller.saved_forms(), &args.form)?.id.clone();
    controller.delete_saved(&id)?;

    if ctx.json {
        output_json(&serde_json::json!({ "deleted": id }));
    } else if !ctx.quiet {
        println!("Deleted form {}", id);
    }
    Ok(())
}
