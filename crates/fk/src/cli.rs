//! Clap CLI definitions for the `fk` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// fk -- dynamic form builder.
///
/// Define forms with typed, validated and derived fields, save them, then
/// fill and submit them.
#[derive(Parser, Debug)]
#[command(
    name = "fk",
    about = "Dynamic form builder",
    long_about = "Define forms with typed, validated and derived fields, save them, then fill and submit them.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// The .formkit directory to use (default: $FORMKIT_DIR, then search upwards).
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a .formkit directory here.
    Init(InitArgs),

    /// Create and save a new empty form.
    #[command(alias = "create")]
    New(NewArgs),

    /// List saved forms.
    #[command(alias = "ls")]
    List,

    /// Show a form's fields.
    #[command(alias = "view")]
    Show(ShowArgs),

    /// Rename a form.
    Rename(RenameArgs),

    /// Delete a saved form.
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Add, change, remove or move fields.
    Field(FieldArgs),

    /// Fill a form with values and show derived values and errors.
    Fill(FillArgs),

    /// Fill a form and submit it; fails if any field is invalid.
    Submit(FillArgs),

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Arguments for `fk init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Storage backend: sqlite, json or memory.
    #[arg(short = 'b', long, default_value = "sqlite")]
    pub backend: String,

    /// Key the saved forms are stored under.
    #[arg(long)]
    pub key: Option<String>,

    /// Overwrite an existing configuration.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Arguments for `fk new`.
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Form name.
    pub name: String,
}

/// Arguments for `fk show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Form id or name.
    pub form: String,
}

/// Arguments for `fk rename`.
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Form id or name.
    pub form: String,
    /// New name.
    pub name: String,
}

/// Arguments for `fk delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Form id or name.
    pub form: String,
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Arguments for `fk field`.
#[derive(Args, Debug)]
pub struct FieldArgs {
    #[command(subcommand)]
    pub command: FieldCommands,
}

/// Field subcommands.
#[derive(Subcommand, Debug)]
pub enum FieldCommands {
    /// Add a field to the end of a form.
    Add(FieldAddArgs),
    /// Change a field.
    Update(FieldUpdateArgs),
    /// Remove a field.
    #[command(alias = "rm")]
    Remove(FieldRemoveArgs),
    /// Move a field to another position (0-based).
    #[command(alias = "mv")]
    Move(FieldMoveArgs),
}

/// Arguments for `fk field add`.
#[derive(Args, Debug)]
pub struct FieldAddArgs {
    /// Form id or name.
    pub form: String,

    /// Field label.
    pub label: String,

    /// Field id (default: generated).
    #[arg(long)]
    pub id: Option<String>,

    /// Field type: text, number, textarea, select, radio, checkbox, date.
    #[arg(short = 't', long = "type", default_value = "text")]
    pub field_type: String,

    /// Placeholder text.
    #[arg(long)]
    pub placeholder: Option<String>,

    /// Default value, parsed according to the field type.
    #[arg(short = 'd', long = "default")]
    pub default_value: Option<String>,

    /// The field must be filled.
    #[arg(long)]
    pub required: bool,

    /// Minimum length.
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Maximum length.
    #[arg(long)]
    pub max_length: Option<usize>,

    /// The value must be an email address.
    #[arg(long)]
    pub email: bool,

    /// The value must be at least 8 characters long and contain a digit.
    #[arg(long)]
    pub password: bool,

    /// Option for select/radio fields as `value` or `value:label` (repeatable).
    #[arg(short = 'o', long = "option")]
    pub options: Vec<String>,

    /// Parent field ids of a derived field (comma-separated).
    #[arg(long, value_delimiter = ',', requires = "formula")]
    pub parents: Vec<String>,

    /// Formula of a derived field.
    #[arg(long)]
    pub formula: Option<String>,
}

/// Arguments for `fk field update`.
#[derive(Args, Debug)]
pub struct FieldUpdateArgs {
    /// Form id or name.
    pub form: String,

    /// Field id.
    pub id: String,

    /// New label.
    #[arg(short = 'l', long)]
    pub label: Option<String>,

    /// New field type.
    #[arg(short = 't', long = "type")]
    pub field_type: Option<String>,

    /// New placeholder text.
    #[arg(long)]
    pub placeholder: Option<String>,

    /// New default value.
    #[arg(short = 'd', long = "default")]
    pub default_value: Option<String>,

    /// Set or clear the required rule.
    #[arg(long)]
    pub required: Option<bool>,

    /// New minimum length.
    #[arg(long)]
    pub min_length: Option<usize>,

    /// New maximum length.
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Set or clear the email rule.
    #[arg(long)]
    pub email: Option<bool>,

    /// Set or clear the password rule.
    #[arg(long)]
    pub password: Option<bool>,

    /// Replace the options (repeatable, `value` or `value:label`).
    #[arg(short = 'o', long = "option")]
    pub options: Vec<String>,

    /// New parent field ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub parents: Option<Vec<String>>,

    /// New formula.
    #[arg(long)]
    pub formula: Option<String>,

    /// Make the field a plain input again.
    #[arg(long, conflicts_with_all = ["parents", "formula"])]
    pub no_derived: bool,
}

/// Arguments for `fk field remove`.
#[derive(Args, Debug)]
pub struct FieldRemoveArgs {
    /// Form id or name.
    pub form: String,
    /// Field id.
    pub id: String,
}

/// Arguments for `fk field move`.
#[derive(Args, Debug)]
pub struct FieldMoveArgs {
    /// Form id or name.
    pub form: String,
    /// Current position.
    pub from: usize,
    /// New position.
    pub to: usize,
}

// ---------------------------------------------------------------------------
// Filling
// ---------------------------------------------------------------------------

/// Arguments for `fk fill` and `fk submit`.
#[derive(Args, Debug)]
pub struct FillArgs {
    /// Form id or name.
    pub form: String,

    /// Field value as `id=value` (repeatable).
    #[arg(short = 's', long = "set")]
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_field_add() {
        let cli = Cli::parse_from([
            "fk", "field", "add", "Signup", "Age", "--id", "age", "-t", "number", "--parents", "dob,x",
            "--formula", "x",
        ]);
        let Some(Commands::Field(FieldArgs {
            command: FieldCommands::Add(args),
        })) = cli.command
        else {
            panic!("expected field add");
        };
        assert_eq!(args.id.as_deref(), Some("age"));
        assert_eq!(args.parents, vec!["dob", "x"]);
    }

    #[test]
    fn parses_repeated_set() {
        let cli = Cli::parse_from(["fk", "--json", "fill", "f", "--set", "a=1", "-s", "b=x=y"]);
        assert!(cli.global.json);
        let Some(Commands::Fill(args)) = cli.command else {
            panic!("expected fill");
        };
        assert_eq!(args.values, vec!["a=1", "b=x=y"]);
    }
}
