mod backup;
mod cli;
mod commands;
mod config;
mod file_utils;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::*;
use commands::configure::ConfigureArgs;
use commands::edit::FieldArgs;
use commands::SaveOptions;

fn init_tracing(verbose: bool) {
    let default = if verbose { "uptable=debug" } else { "uptable=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load()?;
    let loaded = config.clone();

    match cli.command {
        Commands::Configure {
            open_dir,
            save_dir,
            formula_escape,
            show,
        } => {
            let args = ConfigureArgs {
                open_dir,
                save_dir,
                formula_escape,
                show,
            };
            return commands::configure::handle(&mut config, args);
        }

        Commands::Info { package } => {
            commands::inspect::info(&mut config, &package)?;
        }

        Commands::Dump { package, output } => {
            commands::inspect::dump(&mut config, &package, output.as_deref())?;
        }

        Commands::Get {
            package,
            entry,
            property,
            index,
        } => {
            commands::inspect::get(&mut config, &package, &entry, &property, index)?;
        }

        Commands::Set {
            package,
            entry,
            property,
            value,
            index,
            output,
            backup,
        } => {
            let field = FieldArgs {
                entry,
                property,
                index,
            };
            let save = SaveOptions { output, backup };
            commands::edit::set(&mut config, &package, &field, &value, &save)?;
        }

        Commands::Export {
            package,
            output,
            formula_escape,
        } => {
            commands::table::export(&mut config, &package, output.as_deref(), formula_escape)?;
        }

        Commands::Import {
            package,
            csv,
            output,
            backup,
        } => {
            let save = SaveOptions { output, backup };
            commands::edit::import(&mut config, &package, &csv, &save)?;
        }

        Commands::Find { package, text } => {
            commands::table::find(&mut config, &package, &text)?;
        }

        Commands::Scan { dir } => {
            commands::scan::scan(&dir)?;
        }
    }

    // Remembered directories are a convenience; failing to store them is not fatal
    if config != loaded {
        if let Err(err) = config.save() {
            tracing::warn!("Failed to save config: {:#}", err);
        }
    }

    Ok(())
}
