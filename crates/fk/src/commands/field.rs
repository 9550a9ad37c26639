//! `fk field` -- add, update, remove and move fields of a saved form.

use anyhow::{Context, Result, anyhow};
use formkit_core::idgen::new_field_id;
use formkit_core::{DerivedSpec, Field, FieldBuilder, FieldPatch, FieldType, FieldValue};
use formkit_session::FormController;

use crate::cli::{FieldAddArgs, FieldMoveArgs, FieldRemoveArgs, FieldUpdateArgs};
use crate::commands::parse_option;
use crate::context::{RuntimeContext, open_form};
use crate::output::{format_form_detail, output_json};

fn parse_type(name: &str) -> Result<FieldType> {
    name.parse::<FieldType>().map_err(|e| anyhow!(e))
}

fn parse_default(field_type: FieldType, raw: &str) -> Result<FieldValue> {
    field_type
        .parse_input(raw)
        .with_context(|| format!("invalid default value '{}'", raw))
}

/// Builds the field described by `fk field add`.
fn build_field(args: &FieldAddArgs) -> Result<Field> {
    let field_type = parse_type(&args.field_type)?;
    let id = args.id.clone().unwrap_or_else(new_field_id);
    let mut builder = FieldBuilder::new(id, field_type).label(args.label.as_str());
    if let Some(ref placeholder) = args.placeholder {
        builder = builder.placeholder(placeholder.as_str());
    }
    if let Some(ref raw) = args.default_value {
        builder = builder.default_value(parse_default(field_type, raw)?);
    }
    if args.required {
        builder = builder.required();
    }
    if let Some(n) = args.min_length {
        builder = builder.min_length(n);
    }
    if let Some(n) = args.max_length {
        builder = builder.max_length(n);
    }
    if args.email {
        builder = builder.email();
    }
    if args.password {
        builder = builder.password_rule();
    }
    for raw in &args.options {
        let option = parse_option(raw);
        builder = builder.option(option.value, option.label);
    }
    if let Some(ref formula) = args.formula {
        builder = builder.derived(args.parents.iter().map(String::as_str), formula.as_str());
    }
    Ok(builder.build())
}

/// Builds the patch described by `fk field update`, reading the current
/// field for the parts that are merged rather than replaced.
fn build_patch(args: &FieldUpdateArgs, current: &Field) -> Result<FieldPatch> {
    let field_type = args.field_type.as_deref().map(parse_type).transpose()?;
    let effective_type = field_type.unwrap_or(current.field_type);

    let mut patch = FieldPatch {
        field_type,
        label: args.label.clone(),
        placeholder: args.placeholder.clone().map(Some),
        ..FieldPatch::default()
    };
    if let Some(ref raw) = args.default_value {
        patch.default_value = Some(Some(parse_default(effective_type, raw)?));
    }

    let mut rules = current.validations.clone();
    let mut rules_changed = false;
    if let Some(required) = args.required {
        rules.required = required;
        rules_changed = true;
    }
    if let Some(n) = args.min_length {
        rules.min_length = Some(n);
        rules_changed = true;
    }
    if let Some(n) = args.max_length {
        rules.max_length = Some(n);
        rules_changed = true;
    }
    if let Some(email) = args.email {
        rules.email = email;
        rules_changed = true;
    }
    if let Some(password) = args.password {
        rules.password_rule = password;
        rules_changed = true;
    }
    if rules_changed {
        patch.validations = Some(rules);
    }

    if !args.options.is_empty() {
        patch.options = Some(Some(args.options.iter().map(|raw| parse_option(raw)).collect()));
    }

    if args.no_derived {
        patch.derived = Some(None);
    } else if args.parents.is_some() || args.formula.is_some() {
        let base = current.derived.clone().unwrap_or_else(|| DerivedSpec::new(Vec::<String>::new(), ""));
        let parents = args.parents.clone().unwrap_or(base.parent_field_ids);
        let formula = args.formula.clone().unwrap_or(base.formula);
        patch.derived = Some(Some(DerivedSpec::new(parents, formula)));
    }
    Ok(patch)
}

fn finish(ctx: &RuntimeContext, controller: &mut FormController, message: String) -> Result<()> {
    controller.save()?;
    let Some(form) = controller.current_form() else {
        return Ok(());
    };
    if ctx.json {
        output_json(form);
    } else if !ctx.quiet {
        println!("{}", message);
        println!();
        print!("{}", format_form_detail(form));
    }
    Ok(())
}

/// Execute `fk field add`.
pub fn run_add(ctx: &RuntimeContext, args: &FieldAddArgs) -> Result<()> {
    let mut controller = open_form(ctx, &args.form)?;
    let field = build_field(args)?;
    let id = field.id.clone();
    controller
        .add_field(field)
        .with_context(|| format!("failed to add field '{}'", id))?;
    finish(ctx, &mut controller, format!("Added field {}", id))
}

/// Execute `fk field update`.
pub fn run_update(ctx: &RuntimeContext, args: &FieldUpdateArgs) -> Result<()> {
    let mut controller = open_form(ctx, &args.form)?;
    let current = controller
        .current_form()
        .and_then(|form| form.field(&args.id))
        .cloned()
        .with_context(|| format!("field '{}' not found", args.id))?;
    let patch = build_patch(args, &current)?;
    if patch.is_empty() {
        anyhow::bail!("nothing to update for field '{}'", args.id);
    }
    controller
        .update_field(&args.id, &patch)
        .with_context(|| format!("failed to update field '{}'", args.id))?;
    finish(ctx, &mut controller, format!("Updated field {}", args.id))
}

/// Execute `fk field remove`.
pub fn run_remove(ctx: &RuntimeContext, args: &FieldRemoveArgs) -> Result<()> {
    let mut controller = open_form(ctx, &args.form)?;
    controller
        .delete_field(&args.id)
        .with_context(|| format!("failed to remove field '{}'", args.id))?;
    finish(ctx, &mut controller, format!("Removed field {}", args.id))
}

/// Execute `fk field move`.
pub fn run_move(ctx: &RuntimeContext, args: &FieldMoveArgs) -> Result<()> {
    let mut controller = open_form(ctx, &args.form)?;
    controller.reorder_field(args.from, args.to)?;
    finish(ctx, &mut controller, format!("Moved field from {} to {}", args.from, args.to))
}
