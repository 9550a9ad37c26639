//! `fk init` -- create a `.formkit/` directory with a configuration.

use std::env;
use std::fs;

use anyhow::{Context, Result, bail};
use formkit_config::{CONFIG_FILE, FormkitConfig, StorageBackend, StorageConfig, ensure_formkit_dir, save_config};

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Default gitignore content for the `.formkit` directory.
const GITIGNORE_CONTENT: &str = r#"# formkit database files
*.db
*.db-journal
*.db-wal
*.db-shm
"#;

/// Execute the `fk init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let base = match ctx.dir_arg {
        Some(ref dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };
    let backend = parse_backend(&args.backend)?;

    let formkit_dir = ensure_formkit_dir(&base)
        .with_context(|| format!("failed to create .formkit under {}", base.display()))?;
    let config_path = formkit_dir.join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists\n\nThis directory is already initialized. Use --force to overwrite the configuration.",
            config_path.display()
        );
    }

    let mut storage = StorageConfig {
        backend,
        ..StorageConfig::default()
    };
    if let Some(ref key) = args.key {
        storage.key = key.clone();
    }
    let config = FormkitConfig {
        storage,
        ..FormkitConfig::default()
    };
    save_config(&formkit_dir, &config)?;

    let gitignore_path = formkit_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, GITIGNORE_CONTENT)
            .with_context(|| format!("failed to create .gitignore: {}", gitignore_path.display()))?;
    }

    if ctx.json {
        output_json(&serde_json::json!({
            "dir": formkit_dir.display().to_string(),
            "backend": backend,
        }));
    } else if !ctx.quiet {
        println!("fk initialized in {}", formkit_dir.display());
        if let Some(location) = config.storage.location(&formkit_dir) {
            println!("  Storage: {}", location.display());
        }
        println!();
        println!("Run `fk new \"My form\"` to get started.");
    }

    Ok(())
}

fn parse_backend(name: &str) -> Result<StorageBackend> {
    match name.to_ascii_lowercase().as_str() {
        "sqlite" => Ok(StorageBackend::Sqlite),
        "json" => Ok(StorageBackend::Json),
        "memory" => Ok(StorageBackend::Memory),
        other => bail!("unknown storage backend '{}' (expected sqlite, json or memory)", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!(parse_backend("sqlite").unwrap(), StorageBackend::Sqlite);
        assert_eq!(parse_backend("JSON").unwrap(), StorageBackend::Json);
        assert_eq!(parse_backend("memory").unwrap(), StorageBackend::Memory);
        assert!(parse_backend("redis").is_err());
    }
}
