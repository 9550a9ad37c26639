//! Output formatting helpers for the `fk` CLI.
//!
//! JSON output, table formatting, and human-readable form and session
//! display.

use std::fmt::Write as _;
use std::io::{self, Write};

use formkit_core::values::display_string;
use formkit_core::{ErrorMap, Field, FormData, FormSchema};
use serde::Serialize;

/// JSON view of a filled form.
#[derive(Serialize)]
pub struct SessionView<'a> {
    pub form: &'a str,
    pub values: &'a FormData,
    pub errors: &'a ErrorMap,
}

/// Print a value as pretty JSON on stdout.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    let table = render_table(headers, rows);
    if !table.is_empty() {
        let _ = io::stdout().lock().write_all(table.as_bytes());
    }
}

/// Renders rows under headers, columns padded to the widest cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        match widths.get(i) {
            Some(width) => {
                let _ = write!(line, "{:<width$}", cell, width = *width);
            }
            None => line.push_str(cell),
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Columns of `fk list`.
pub const FORM_HEADERS: [&str; 4] = ["ID", "NAME", "FIELDS", "CREATED"];

pub fn format_form_row(form: &FormSchema) -> Vec<String> {
    vec![
        form.id.clone(),
        form.name.clone(),
        form.fields.len().to_string(),
        form.created_at.format("%Y-%m-%d %H:%M").to_string(),
    ]
}

/// One-line summary of a field's rules, e.g. `required, min 3`.
pub fn format_rules(field: &Field) -> String {
    let rules = &field.validations;
    let mut parts = Vec::new();
    if rules.required {
        parts.push("required".to_owned());
    }
    if let Some(n) = rules.min_length {
        parts.push(format!("min {n}"));
    }
    if let Some(n) = rules.max_length {
        parts.push(format!("max {n}"));
    }
    if rules.email {
        parts.push("email".to_owned());
    }
    if rules.password_rule {
        parts.push("password".to_owned());
    }
    parts.join(", ")
}

/// Multi-line description of a form and its fields.
pub fn format_form_detail(form: &FormSchema) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", form.name, form.id);
    let _ = writeln!(out, "Created: {}", form.created_at.format("%Y-%m-%d %H:%M UTC"));

    if form.fields.is_empty() {
        out.push_str("\nNo fields.\n");
        return out;
    }

    out.push_str("\nFIELDS\n");
    for (i, field) in form.fields.iter().enumerate() {
        let _ = write!(out, "  {}. {} [{}] {}", i, field.id, field.field_type, field.label);
        let rules = format_rules(field);
        if !rules.is_empty() {
            let _ = write!(out, " ({rules})");
        }
        out.push('\n');
        if let Some(ref value) = field.default_value {
            let _ = writeln!(out, "     default: {}", display_string(value));
        }
        if let Some(ref options) = field.options {
            let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
            let _ = writeln!(out, "     options: {}", values.join(", "));
        }
        if let Some(ref derived) = field.derived {
            let _ = writeln!(
                out,
                "     = {}  (from {})",
                derived.formula,
                derived.parent_field_ids.join(", ")
            );
        }
    }
    out
}

/// Field values and errors in form order.
pub fn format_session(form: &FormSchema, data: &FormData, errors: &ErrorMap) -> String {
    let mut out = String::new();
    for field in &form.fields {
        let value = data.get(&field.id).map(display_string).unwrap_or_default();
        let marker = if field.is_derived() { "=" } else { ":" };
        let _ = write!(out, "{}{} {}", field.label, marker, value);
        if let Some(message) = errors.get(&field.id) {
            let _ = write!(out, "  ! {message}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use formkit_core::{FieldBuilder, FieldType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn form() -> FormSchema {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        let mut form = FormSchema::with_id("form_1", "Order", at);
        form.add_field(
            FieldBuilder::new("qty", FieldType::Number)
                .label("Quantity")
                .required()
                .default_value(1)
                .build(),
        )
        .unwrap();
        form.add_field(
            FieldBuilder::new("total", FieldType::Number)
                .label("Total")
                .derived(["qty"], "qty * 2")
                .build(),
        )
        .unwrap();
        form
    }

    #[test]
    fn table_aligns_columns() {
        let rows = vec![
            vec!["form_1".to_string(), "A".to_string()],
            vec!["form_22".to_string(), "Longer name".to_string()],
        ];
        let table = render_table(&["ID", "NAME"], &rows);
        assert_eq!(
            table,
            "ID       NAME\n-------  -----------\nform_1   A\nform_22  Longer name\n"
        );
        assert_eq!(render_table(&["ID"], &[]), "");
    }

    #[test]
    fn form_row() {
        assert_eq!(format_form_row(&form()), vec!["form_1", "Order", "2", "2024-03-09 14:30"]);
    }

    #[test]
    fn detail_lists_fields_and_formulas() {
        let detail = format_form_detail(&form());
        assert!(detail.starts_with("Order (form_1)\n"));
        assert!(detail.contains("0. qty [number] Quantity (required)"));
        assert!(detail.contains("default: 1"));
        assert!(detail.contains("= qty * 2  (from qty)"));
    }

    #[test]
    fn session_marks_errors_and_derived() {
        let data: FormData = [("qty", json!("")), ("total", json!(0))].into_iter().collect();
        let errors: ErrorMap = [("qty", "Quantity is required")].into_iter().collect();
        assert_eq!(
            format_session(&form(), &data, &errors),
            "Quantity:   ! Quantity is required\nTotal= 0\n"
        );
    }
}
