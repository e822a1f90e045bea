//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up uptable CLI defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Settings passed to `configure`
#[derive(Debug, Default)]
pub struct ConfigureArgs {
    pub open_dir: Option<PathBuf>,
    pub save_dir: Option<PathBuf>,
    pub formula_escape: Option<bool>,
    pub show: bool,
}

/// Handle the configure command
pub fn handle(config: &mut Config, args: ConfigureArgs) -> Result<()> {
    if args.show {
        show_config(config);
        return Ok(());
    }

    if !apply(config, args) {
        show_usage();
        return Ok(());
    }

    config.save()?;
    show_config(config);
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Copy the given settings into `config`; returns whether anything was set
pub fn apply(config: &mut Config, args: ConfigureArgs) -> bool {
    let mut changed = false;

    if let Some(dir) = args.open_dir {
        config.open_dir = Some(dir);
        changed = true;
    }
    if let Some(dir) = args.save_dir {
        config.save_dir = Some(dir);
        changed = true;
    }
    if let Some(escape) = args.formula_escape {
        config.formula_escape = escape;
        changed = true;
    }

    changed
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.open_dir {
        Some(dir) => println!("Open directory: {}", dir.display()),
        None => println!("No open directory configured"),
    }
    match &config.save_dir {
        Some(dir) => println!("Save directory: {}", dir.display()),
        None => println!("No save directory configured"),
    }
    println!("Formula escape: {}", config.formula_escape);

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: uptable configure --open-dir DIR --save-dir DIR --formula-escape true|false");
    println!("   or: uptable configure --show");
}
