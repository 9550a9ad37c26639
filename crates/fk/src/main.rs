//! `fk` -- build, fill and submit dynamic forms from the command line.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, FieldCommands};
use context::RuntimeContext;

/// Filter used under `--verbose`.
const VERBOSE_FILTER: &str =
    "fk=debug,formkit_core=debug,formkit_formula=debug,formkit_storage=debug,formkit_config=debug,formkit_session=debug";

fn main() {
    let cli = Cli::parse();

    let ctx = RuntimeContext::from_global_args(&cli.global);

    let filter = if ctx.verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Some(Commands::Version) => commands::version::run(&ctx),
        Some(Commands::Init(args)) => commands::init::run(&ctx, &args),
        Some(Commands::New(args)) => commands::new::run(&ctx, &args),
        Some(Commands::List) => commands::list::run(&ctx),
        Some(Commands::Show(args)) => commands::show::run(&ctx, &args),
        Some(Commands::Rename(args)) => commands::rename::run(&ctx, &args),
        Some(Commands::Delete(args)) => commands::delete::run(&ctx, &args),
        Some(Commands::Field(args)) => match args.command {
            FieldCommands::Add(args) => commands::field::run_add(&ctx, &args),
            FieldCommands::Update(args) => commands::field::run_update(&ctx, &args),
            FieldCommands::Remove(args) => commands::field::run_remove(&ctx, &args),
            FieldCommands::Move(args) => commands::field::run_move(&ctx, &args),
        },
        Some(Commands::Fill(args)) => commands::fill::run(&ctx, &args),
        Some(Commands::Submit(args)) => commands::submit::run(&ctx, &args),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        if ctx.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
