//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pagewright template transpiler CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file path (default: pagewright.toml)
    #[arg(short = 'C', long, default_value = "pagewright.toml")]
    pub config: PathBuf,

    /// Log every processed file
    #[arg(short, long)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Transpile a template file, or a whole project directory
    ///
    /// A single file is written to stdout unless `--output` is given.
    Build {
        /// Template file or project directory
        path: PathBuf,

        /// Output directory (default: .pagewright)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove the output directory
    Clean {
        /// Output directory (default: .pagewright)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
