//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Merge global data files with document front matter
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: globals.toml)
    #[arg(short = 'C', long, default_value = "globals.toml")]
    pub config: PathBuf,

    /// Data directory path (relative to project root)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared arguments for Build and Watch commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Remove the output directory before building
    #[arg(long)]
    pub clean: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Strip front matter from every document and emit its merged data
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Print the global data namespace as JSON
    Data {
        /// Only print the value at this dotted key path (e.g. `team.members`)
        key: Option<String>,
    },

    /// Build, then rebuild affected documents when data or content changes
    Watch {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Commands::Build { build_args } | Commands::Watch { build_args } => Some(build_args),
            Commands::Data { .. } => None,
        }
    }
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build { .. })
    }
    pub const fn is_data(&self) -> bool {
        matches!(self.command, Commands::Data { .. })
    }
    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Commands::Watch { .. })
    }
}
