//! `fk show` -- display a form and its fields.

use anyhow::Result;

use crate::cli::ShowArgs;
use crate::context::{RuntimeContext, resolve_form};
use crate::output::{format_form_detail, output_json};

/// Execute the `fk show` command.
pub fn run(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    let controller = ctx.controller()?;
    let form = resolve_form(controller.saved_forms(), &args.form)?;

    if ctx.json {
        output_json(form);
    } else {
        print!("{}", format_form_detail(form));
    }
    Ok(())
}
