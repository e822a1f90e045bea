//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "uptable")]
#[command(about = "Unreal package property table editor", long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show header, export and schema summary
    #[command(visible_alias = "i")]
    Info {
        /// Path to the .uasset or .uexp file
        package: PathBuf,
    },

    /// Dump names, export, schema and entries as JSON
    Dump {
        /// Path to the .uasset or .uexp file
        package: PathBuf,

        /// Write JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print one field value
    #[command(visible_alias = "g")]
    Get {
        /// Path to the .uasset or .uexp file
        package: PathBuf,

        /// Entry index or tag
        entry: String,

        /// Property name
        property: String,

        /// Array element index
        #[arg(long)]
        index: Option<usize>,
    },

    /// Overwrite one field value in place and save
    #[command(visible_alias = "s")]
    Set {
        /// Path to the .uasset or .uexp file
        package: PathBuf,

        /// Entry index or tag
        entry: String,

        /// Property name
        property: String,

        /// New value, parsed according to the property type
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Array element index
        #[arg(long)]
        index: Option<usize>,

        /// Write the property file here instead of over the original
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Back up the original property file before writing
        #[arg(short, long)]
        backup: bool,
    },

    /// Export the entry table as CSV
    #[command(visible_alias = "e")]
    Export {
        /// Path to the .uasset or .uexp file
        package: PathBuf,

        /// Write CSV to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wrap numeric cells as ="n" (defaults to the configured setting)
        #[arg(long)]
        formula_escape: Option<bool>,
    },

    /// Apply the changed cells of an edited CSV and save
    Import {
        /// Path to the .uasset or .uexp file
        package: PathBuf,

        /// CSV file previously produced by `export`
        csv: PathBuf,

        /// Write the property file here instead of over the original
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Back up the original property file before writing
        #[arg(short, long)]
        backup: bool,
    },

    /// Search tags and values (case-insensitive)
    #[command(visible_alias = "f")]
    Find {
        /// Path to the .uasset or .uexp file
        package: PathBuf,

        /// Text to search for
        text: String,
    },

    /// Report which packages under a directory decode
    Scan {
        /// Directory to walk
        dir: PathBuf,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Directory relative package paths are resolved against
        #[arg(long)]
        open_dir: Option<PathBuf>,

        /// Directory relative output paths are resolved against
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// Default for CSV formula escaping
        #[arg(long)]
        formula_escape: Option<bool>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
