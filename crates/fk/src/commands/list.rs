//! `fk list` -- list saved forms.

use anyhow::Result;

use crate::context::RuntimeContext;
use crate::output::{FORM_HEADERS, format_form_row, output_json, output_table};

/// Execute the `fk list` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let controller = ctx.controller()?;
    let forms = controller.saved_forms();

    if ctx.json {
        output_json(&forms);
    } else if forms.is_empty() {
        if !ctx.quiet {
            println!("No saved forms.");
        }
    } else {
        let rows: Vec<Vec<String>> = forms.iter().map(format_form_row).collect();
        output_table(&FORM_HEADERS, &rows);
    }
    Ok(())
}
